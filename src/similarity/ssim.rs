//! Windowed structural similarity on 8-bit grayscale images.
//!
//! Uniform window, sample covariance, symmetric border handling, and the mean
//! taken over the interior where the window fits entirely.

use image::GrayImage;

use super::{SimilarityError, SsimConfig};

/// Mean SSIM of two equally sized grayscale images.
pub fn structural_similarity(
    a: &GrayImage,
    b: &GrayImage,
    config: &SsimConfig,
) -> Result<f64, SimilarityError> {
    if a.dimensions() != b.dimensions() {
        return Err(SimilarityError::SizeMismatch {
            left: a.dimensions(),
            right: b.dimensions(),
        });
    }

    let (w, h) = a.dimensions();
    let (w, h) = (w as usize, h as usize);
    let win = config.win_size;
    if win < 3 || win % 2 == 0 {
        return Err(SimilarityError::Window(win));
    }
    if w < win || h < win {
        return Err(SimilarityError::TooSmall {
            width: w as u32,
            height: h as u32,
            win_size: win,
        });
    }

    let x: Vec<f64> = a.as_raw().iter().map(|&v| f64::from(v)).collect();
    let y: Vec<f64> = b.as_raw().iter().map(|&v| f64::from(v)).collect();
    let xx: Vec<f64> = x.iter().map(|v| v * v).collect();
    let yy: Vec<f64> = y.iter().map(|v| v * v).collect();
    let xy: Vec<f64> = x.iter().zip(&y).map(|(p, q)| p * q).collect();

    let ux = uniform_filter(&x, w, h, win);
    let uy = uniform_filter(&y, w, h, win);
    let uxx = uniform_filter(&xx, w, h, win);
    let uyy = uniform_filter(&yy, w, h, win);
    let uxy = uniform_filter(&xy, w, h, win);

    let np = (win * win) as f64;
    let cov_norm = np / (np - 1.0);
    let c1 = (config.k1 * config.data_range).powi(2);
    let c2 = (config.k2 * config.data_range).powi(2);

    let pad = (win - 1) / 2;
    let mut sum = 0.0;
    let mut count = 0usize;
    for row in pad..h - pad {
        for col in pad..w - pad {
            let i = row * w + col;
            let vx = cov_norm * (uxx[i] - ux[i] * ux[i]);
            let vy = cov_norm * (uyy[i] - uy[i] * uy[i]);
            let vxy = cov_norm * (uxy[i] - ux[i] * uy[i]);

            let a1 = 2.0 * ux[i] * uy[i] + c1;
            let a2 = 2.0 * vxy + c2;
            let b1 = ux[i] * ux[i] + uy[i] * uy[i] + c1;
            let b2 = vx + vy + c2;
            sum += (a1 * a2) / (b1 * b2);
            count += 1;
        }
    }

    Ok(sum / count as f64)
}

/// Separable box mean over a `win x win` window; borders mirror with the edge
/// sample repeated (`d c b a | a b c d`).
fn uniform_filter(data: &[f64], w: usize, h: usize, win: usize) -> Vec<f64> {
    let rows = filter_axis(data, w, h, win, true);
    filter_axis(&rows, w, h, win, false)
}

fn filter_axis(data: &[f64], w: usize, h: usize, win: usize, horizontal: bool) -> Vec<f64> {
    let half = (win / 2) as isize;
    let (len, lines) = if horizontal { (w, h) } else { (h, w) };
    let at = |line: usize, pos: usize| {
        if horizontal {
            line * w + pos
        } else {
            pos * w + line
        }
    };

    let mut out = vec![0.0; data.len()];
    for line in 0..lines {
        for pos in 0..len {
            let mut acc = 0.0;
            for k in -half..=half {
                let src = reflect(pos as isize + k, len);
                acc += data[at(line, src)];
            }
            out[at(line, pos)] = acc / win as f64;
        }
    }
    out
}

fn reflect(i: isize, len: usize) -> usize {
    let n = len as isize;
    let period = 2 * n;
    let mut i = i.rem_euclid(period);
    if i >= n {
        i = period - 1 - i;
    }
    i as usize
}
