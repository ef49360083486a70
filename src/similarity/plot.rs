//! Two-panel PNG of a score distribution: scatter by pair index and a KDE curve.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use super::SimilarityError;
use super::kde::{self, DensityCurve};

pub const DEFAULT_SIZE: (u32, u32) = (1400, 560);

const SCATTER_COLOR: RGBColor = RGBColor(255, 165, 0);
const DENSITY_COLOR: RGBColor = RGBColor(0, 128, 0);

/// Family name the bundled font is registered under; plotters' default family.
const FONT: &str = "sans-serif";
static FONT_BYTES: &[u8] = include_bytes!("../../assets/fonts/NotoSans-Regular.ttf");

const CAPTION_SIZE: u32 = 22;
const DESC_SIZE: u32 = 16;
const LABEL_SIZE: u32 = 13;

fn plot_err(e: impl std::fmt::Display) -> SimilarityError {
    SimilarityError::Plot(e.to_string())
}

fn register_font() -> Result<(), SimilarityError> {
    plotters::style::register_font(FONT, FontStyle::Normal, FONT_BYTES)
        .map_err(|_| plot_err("bundled font could not be parsed"))
}

/// Renders the plot into an RGB buffer of `width * height * 3` bytes.
pub fn render_rgb(scores: &[f64], width: u32, height: u32) -> Result<Vec<u8>, SimilarityError> {
    let pixel_count = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| plot_err("width*height overflow"))?;
    let mut rgb = vec![255u8; pixel_count * 3];
    register_font()?;

    {
        let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_err)?;
        let panels = root.split_evenly((1, 2));

        draw_scatter(&panels[0], scores)?;
        let curve = kde::density_curve(scores);
        if curve.is_none() {
            tracing::warn!(
                count = scores.len(),
                "not enough spread in the scores for a density estimate"
            );
        }
        draw_density(&panels[1], curve.as_ref())?;

        root.present().map_err(plot_err)?;
    }

    Ok(rgb)
}

/// Renders and saves the plot as an image file; the format follows the extension.
pub fn save_plot(path: &Path, scores: &[f64], size: (u32, u32)) -> Result<(), SimilarityError> {
    let (width, height) = size;
    let rgb = render_rgb(scores, width, height)?;
    let img = image::RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| plot_err("plot buffer does not match its size"))?;
    img.save(path)?;
    tracing::info!(path = %path.display(), "wrote plot");
    Ok(())
}

fn chart_builder<'a, 'b>(
    area: &'a DrawingArea<BitMapBackend<'b>, Shift>,
    title: &str,
) -> ChartBuilder<'a, 'b, BitMapBackend<'b>> {
    let mut builder = ChartBuilder::on(area);
    builder
        .caption(title, (FONT, CAPTION_SIZE))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(65);
    builder
}

fn draw_scatter(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    scores: &[f64],
) -> Result<(), SimilarityError> {
    let x_max = scores.len().max(1) as f64;
    let (lo, hi) = padded_range(scores.iter().copied());

    let mut chart = chart_builder(area, "SSIM Score per Image Pair")
        .build_cartesian_2d(-0.5..x_max, lo..hi)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Pair Index")
        .y_desc("SSIM Score")
        .axis_desc_style((FONT, DESC_SIZE))
        .label_style((FONT, LABEL_SIZE))
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(
            scores
                .iter()
                .enumerate()
                .map(|(i, &s)| Circle::new((i as f64, s), 3, SCATTER_COLOR.filled())),
        )
        .map_err(plot_err)?;
    Ok(())
}

/// Filled KDE panel; without a curve only the titled, empty axes are drawn.
fn draw_density(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    curve: Option<&DensityCurve>,
) -> Result<(), SimilarityError> {
    let (x_lo, x_hi, y_hi) = match curve {
        Some(curve) => {
            let y_hi = curve.density.iter().copied().fold(0.0, f64::max) * 1.1;
            (
                curve.xs.first().copied().unwrap_or(0.0),
                curve.xs.last().copied().unwrap_or(1.0),
                if y_hi > 0.0 { y_hi } else { 1.0 },
            )
        }
        None => (0.0, 1.0, 1.0),
    };

    let mut chart = chart_builder(area, "SSIM KDE (Density Estimation)")
        .build_cartesian_2d(x_lo..x_hi, 0.0..y_hi)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("SSIM Score")
        .y_desc("Density")
        .axis_desc_style((FONT, DESC_SIZE))
        .label_style((FONT, LABEL_SIZE))
        .draw()
        .map_err(plot_err)?;

    let Some(curve) = curve else {
        return Ok(());
    };
    let line = || curve.xs.iter().copied().zip(curve.density.iter().copied());
    chart
        .draw_series(AreaSeries::new(line(), 0.0, DENSITY_COLOR.mix(0.3).filled()))
        .map_err(plot_err)?;
    chart
        .draw_series(LineSeries::new(line(), DENSITY_COLOR.stroke_width(2)))
        .map_err(plot_err)?;
    Ok(())
}

/// Value range with a 5% margin; degenerate input gets a unit-wide range.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let span = max - min;
    if span <= f64::EPSILON {
        return (min - 0.5, max + 0.5);
    }
    (min - span * 0.05, max + span * 0.05)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_range_handles_degenerate_input() {
        assert_eq!(padded_range(std::iter::empty()), (0.0, 1.0));
        assert_eq!(padded_range([0.25].into_iter()), (-0.25, 0.75));
        let (lo, hi) = padded_range([0.0, 1.0].into_iter());
        assert!(lo < 0.0 && hi > 1.0);
    }

    #[test]
    fn renders_non_blank_buffer() {
        let scores = [0.12, 0.35, 0.4, 0.41, 0.58, 0.7];
        let rgb = render_rgb(&scores, 400, 200).expect("render");
        assert_eq!(rgb.len(), 400 * 200 * 3);
        assert!(rgb.iter().any(|&b| b != 255));
    }

    fn has_ink(rgb: &[u8], width: u32, cols: std::ops::Range<u32>, rows: std::ops::Range<u32>) -> bool {
        rows.flat_map(|y| cols.clone().map(move |x| (x, y)))
            .any(|(x, y)| {
                let i = ((y * width + x) * 3) as usize;
                rgb[i..i + 3].iter().all(|&c| c < 160)
            })
    }

    #[test]
    fn titles_and_axis_text_are_drawn() {
        let scores = [0.12, 0.35, 0.4, 0.41, 0.58, 0.7];
        let (w, h) = (800, 320);
        let rgb = render_rgb(&scores, w, h).expect("render");

        // Captions sit in the top band of each panel, above the plotting area.
        assert!(has_ink(&rgb, w, 0..w / 2, 0..40));
        assert!(has_ink(&rgb, w, w / 2..w, 0..40));
        // Tick values and the rotated y description live left of the y axis.
        assert!(has_ink(&rgb, w, 0..60, 60..h - 60));
        // The x description runs along the bottom.
        assert!(has_ink(&rgb, w, 60..w / 2, h - 40..h));
    }

    #[test]
    fn empty_scores_still_render() {
        let rgb = render_rgb(&[], 200, 100).expect("render");
        assert_eq!(rgb.len(), 200 * 100 * 3);
    }
}
