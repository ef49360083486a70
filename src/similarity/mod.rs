//! Pairwise SSIM statistics over an image folder.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use serde::Serialize;

use crate::walk::ImageWalk;

pub mod kde;
pub mod plot;
pub mod ssim;

pub use ssim::structural_similarity;

/// Parameters of the similarity scan.
#[derive(Debug, Clone)]
pub struct SsimConfig {
    /// Images are resized to `canvas x canvas` before comparison.
    pub canvas: u32,
    pub win_size: usize,
    pub data_range: f64,
    pub k1: f64,
    pub k2: f64,
}

impl Default for SsimConfig {
    fn default() -> Self {
        Self {
            canvas: 128,
            win_size: 7,
            data_range: 255.0,
            k1: 0.01,
            k2: 0.03,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SimilarityError {
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image sizes differ: {left:?} vs {right:?}")]
    SizeMismatch { left: (u32, u32), right: (u32, u32) },

    #[error("window size must be odd and at least 3, got {0}")]
    Window(usize),

    #[error("image {width}x{height} is smaller than the {win_size}px window")]
    TooSmall {
        width: u32,
        height: u32,
        win_size: usize,
    },

    #[error("plot rendering failed: {0}")]
    Plot(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A grayscale image at comparison resolution, with the file name it came from.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub name: String,
    pub gray: GrayImage,
}

/// Bilinear resize to the configured canvas, then grayscale with Rec. 601 weights.
pub fn prepare(image: &DynamicImage, config: &SsimConfig) -> GrayImage {
    let rgb = image::imageops::resize(&image.to_rgb8(), config.canvas, config.canvas, FilterType::Triangle);
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        Luma([luma_601(r, g, b)])
    })
}

fn luma_601(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
    y.round().clamp(0.0, 255.0) as u8
}

/// Loads and prepares the images of `dir` in name order.
///
/// Unreadable files are skipped. `max_images` caps the number of images kept;
/// a cap of zero means no cap.
pub fn load_folder(
    dir: &Path,
    extensions: &[&str],
    max_images: Option<usize>,
    config: &SsimConfig,
) -> Result<Vec<PreparedImage>, SimilarityError> {
    let walk = ImageWalk::scan_with(dir, extensions).map_err(|source| SimilarityError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let cap = max_images.filter(|&max| max > 0);
    let mut images = Vec::new();
    for path in walk.files() {
        if cap.is_some_and(|max| images.len() >= max) {
            break;
        }
        match image::open(path) {
            Ok(img) => images.push(PreparedImage {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                gray: prepare(&img, config),
            }),
            Err(e) => tracing::warn!(path = %path.display(), "failed to read image: {e}"),
        }
    }
    Ok(images)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairScore {
    pub first: String,
    pub second: String,
    pub score: f64,
}

/// Scores every unordered pair `(i, j)`, `i < j`, in combinatorial order.
///
/// `on_pair` sees each score as soon as it is computed.
pub fn scan_pairs(
    images: &[PreparedImage],
    config: &SsimConfig,
    mut on_pair: impl FnMut(&PairScore),
) -> Result<Vec<PairScore>, SimilarityError> {
    let n = images.len();
    let mut scores = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for (i, first) in images.iter().enumerate() {
        for second in &images[i + 1..] {
            let score = structural_similarity(&first.gray, &second.gray, config)?;
            let pair = PairScore {
                first: first.name.clone(),
                second: second.name.clone(),
                score,
            };
            on_pair(&pair);
            scores.push(pair);
        }
    }
    Ok(scores)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl ScoreSummary {
    pub fn from_scores(scores: &[f64]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let count = scores.len();
        let mean = scores.iter().sum::<f64>() / count as f64;
        let var = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / count as f64;
        Some(Self {
            count,
            mean,
            std: var.sqrt(),
            min: scores.iter().copied().fold(f64::INFINITY, f64::min),
            max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SimilarityReport<'a> {
    pub folder: &'a Path,
    pub images: Vec<&'a str>,
    pub summary: Option<ScoreSummary>,
    pub pairs: &'a [PairScore],
}

pub fn write_report(path: &Path, report: &SimilarityReport<'_>) -> Result<(), SimilarityError> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).map_err(|source| SimilarityError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn prepared(name: &str, shade: u8) -> PreparedImage {
        PreparedImage {
            name: name.to_string(),
            gray: GrayImage::from_fn(16, 16, |x, y| Luma([shade.wrapping_add((x * 9 + y * 5) as u8)])),
        }
    }

    #[test]
    fn prepare_resizes_to_canvas() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 90, Rgb([10, 200, 30])));
        let gray = prepare(&img, &SsimConfig::default());
        assert_eq!(gray.dimensions(), (128, 128));
        assert_eq!(gray.get_pixel(64, 64).0, [124]);
    }

    #[test]
    fn gray_uses_rec601_weights() {
        let config = SsimConfig::default();
        for (rgb, expected) in [([255, 0, 0], 76), ([0, 255, 0], 150), ([0, 0, 255], 29), ([255, 255, 255], 255)] {
            let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, Rgb(rgb)));
            assert_eq!(prepare(&img, &config).get_pixel(0, 0).0, [expected], "{rgb:?}");
        }
    }

    #[test]
    fn pairs_follow_combinatorial_order() {
        let images = vec![prepared("a", 0), prepared("b", 30), prepared("c", 60), prepared("d", 90)];
        let mut seen = Vec::new();
        let scores = scan_pairs(&images, &SsimConfig::default(), |p| {
            seen.push(format!("{}{}", p.first, p.second));
        })
        .expect("scan");

        assert_eq!(seen, ["ab", "ac", "ad", "bc", "bd", "cd"]);
        assert_eq!(scores.len(), 6);
    }

    #[test]
    fn fewer_than_two_images_have_no_pairs() {
        let scores = scan_pairs(&[prepared("a", 0)], &SsimConfig::default(), |_| {}).expect("scan");
        assert!(scores.is_empty());
        assert!(ScoreSummary::from_scores(&[]).is_none());
    }

    #[test]
    fn summary_statistics() {
        let s = ScoreSummary::from_scores(&[0.2, 0.4, 0.9]).expect("summary");
        assert_eq!(s.count, 3);
        assert!((s.mean - 0.5).abs() < 1e-12);
        assert_eq!(s.min, 0.2);
        assert_eq!(s.max, 0.9);
    }
}
