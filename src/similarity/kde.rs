//! Gaussian kernel density estimate of a score sample.

use std::f64::consts::PI;

/// Number of evaluation points of a density curve.
pub const GRID_SIZE: usize = 200;
/// How many bandwidths the curve extends past the sample range.
pub const CUT: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DensityCurve {
    pub bandwidth: f64,
    pub xs: Vec<f64>,
    pub density: Vec<f64>,
}

/// Scott's rule bandwidth: `std * n^(-1/5)`, using the unbiased standard deviation.
///
/// Returns `None` for fewer than two samples or a zero spread.
pub fn scott_bandwidth(samples: &[f64]) -> Option<f64> {
    let n = samples.len();
    if n < 2 {
        return None;
    }
    let mean = samples.iter().sum::<f64>() / n as f64;
    let var = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = var.sqrt();
    if std <= f64::EPSILON {
        return None;
    }
    Some(std * (n as f64).powf(-0.2))
}

pub fn evaluate(samples: &[f64], bandwidth: f64, x: f64) -> f64 {
    let norm = 1.0 / (samples.len() as f64 * bandwidth * (2.0 * PI).sqrt());
    samples
        .iter()
        .map(|s| {
            let z = (x - s) / bandwidth;
            (-0.5 * z * z).exp()
        })
        .sum::<f64>()
        * norm
}

/// Density over `[min - CUT*bw, max + CUT*bw]`, or `None` when the sample has no spread.
pub fn density_curve(samples: &[f64]) -> Option<DensityCurve> {
    let bandwidth = scott_bandwidth(samples)?;
    let min = samples.iter().copied().fold(f64::INFINITY, f64::min) - CUT * bandwidth;
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max) + CUT * bandwidth;
    let step = (max - min) / (GRID_SIZE - 1) as f64;

    let xs: Vec<f64> = (0..GRID_SIZE).map(|i| min + step * i as f64).collect();
    let density = xs.iter().map(|&x| evaluate(samples, bandwidth, x)).collect();
    Some(DensityCurve {
        bandwidth,
        xs,
        density,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn bandwidth_follows_scott() {
        let samples = [0.2, 0.4, 0.6, 0.8];
        let bw = scott_bandwidth(&samples).expect("bw");
        let std = (0.2f64 / 3.0).sqrt();
        assert_abs_diff_eq!(bw, std * 4f64.powf(-0.2), epsilon = 1e-12);
    }

    #[test]
    fn degenerate_samples_have_no_curve() {
        assert!(density_curve(&[]).is_none());
        assert!(density_curve(&[0.5]).is_none());
        assert!(density_curve(&[0.5, 0.5, 0.5]).is_none());
    }

    #[test]
    fn curve_integrates_to_one() {
        let samples = [0.31, 0.42, 0.44, 0.5, 0.52, 0.58, 0.61, 0.77];
        let curve = density_curve(&samples).expect("curve");
        assert_eq!(curve.xs.len(), GRID_SIZE);

        let area: f64 = curve
            .xs
            .windows(2)
            .zip(curve.density.windows(2))
            .map(|(x, d)| (x[1] - x[0]) * (d[0] + d[1]) / 2.0)
            .sum();
        assert_abs_diff_eq!(area, 1.0, epsilon = 0.01);
    }

    #[test]
    fn density_peaks_inside_sample_range() {
        let samples = [0.5, 0.52, 0.48, 0.51, 0.49];
        let curve = density_curve(&samples).expect("curve");
        let (peak_idx, _) = curve
            .density
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &d)| if d > best.1 { (i, d) } else { best });
        let peak_x = curve.xs[peak_idx];
        assert!((0.48..=0.52).contains(&peak_x), "peak at {peak_x}");
    }
}
