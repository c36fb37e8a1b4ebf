//! PNG previews written next to the model
//!
//! * the first raw frame beside its attenuation projection
//! * the three orthogonal centre slices of the reconstruction

use std::path::Path;

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, RgbImage, imageops};
use ndarray::{ArrayView2, Axis};
use tracing::debug;

use crate::tomo_pipeline::common::error::{PipelineError, Result};
use crate::tomo_pipeline::config::VisualizationConfig;
use crate::tomo_pipeline::frames::FirstFrameSnapshot;
use crate::tomo_pipeline::reconstruction::Volume;

/// Values at the `low` and `high` percentiles (0-100), NaN ignored.
pub fn percentile_range<'a>(
    values: impl IntoIterator<Item = &'a f32>,
    (low, high): (f32, f32),
) -> Option<(f32, f32)> {
    let mut sorted: Vec<f32> = values.into_iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_unstable_by(f32::total_cmp);
    let last = sorted.len() - 1;
    let at = |p: f32| {
        let rank = (p.clamp(0.0, 100.0) / 100.0 * last as f32).round() as usize;
        sorted[rank.min(last)]
    };
    Some((at(low), at(high)))
}

/// Display window for `volume`: percentile stretch or plain min/max.
pub fn contrast_range(volume: &Volume, config: &VisualizationConfig) -> Option<(f32, f32)> {
    if config.auto_contrast {
        percentile_range(volume.as_array().iter(), config.contrast_percentiles)
    } else {
        volume.min_max()
    }
}

/// Maps `[low, high]` linearly onto 0-255, clamping outside values.
pub fn to_gray(data: ArrayView2<'_, f32>, (low, high): (f32, f32)) -> GrayImage {
    let (rows, cols) = data.dim();
    let span = high - low;
    ImageBuffer::from_fn(cols as u32, rows as u32, |x, y| {
        let value = data[[y as usize, x as usize]];
        let level = if span > 0.0 {
            ((value - low) / span).clamp(0.0, 1.0) * 255.0
        } else {
            0.0
        };
        // NaN saturates to 0
        Luma([level.round() as u8])
    })
}

fn hstack(tiles: &[GrayImage]) -> GrayImage {
    let width = tiles.iter().map(|t| t.width()).sum();
    let height = tiles.iter().map(|t| t.height()).max().unwrap_or(0);
    let mut canvas = GrayImage::new(width, height);
    let mut x = 0i64;
    for tile in tiles {
        imageops::replace(&mut canvas, tile, x, 0);
        x += i64::from(tile.width());
    }
    canvas
}

/// Centre slices across each axis, side by side, sharing one display window.
pub fn middle_slices_image(volume: &Volume, config: &VisualizationConfig) -> Result<GrayImage> {
    let (d0, d1, d2) = volume.shape();
    let range = contrast_range(volume, config)
        .ok_or_else(|| PipelineError::ExportError("volume has no displayable values".to_string()))?;
    debug!(low = range.0, high = range.1, "Middle slice display window");

    let data = volume.as_array();
    let tiles: Vec<GrayImage> = [(0, d0), (1, d1), (2, d2)]
        .into_iter()
        .map(|(axis, len)| to_gray(data.index_axis(Axis(axis), len / 2), range))
        .collect();
    Ok(hstack(&tiles))
}

pub fn save_middle_slices(volume: &Volume, config: &VisualizationConfig, path: &Path) -> Result<()> {
    middle_slices_image(volume, config)?
        .save(path)
        .map_err(|e| PipelineError::EncodeError(format!("{}: {}", path.display(), e)))
}

/// Raw frame scaled to the projection height, then the projection in grayscale.
pub fn first_frame_comparison_image(snapshot: &FirstFrameSnapshot) -> RgbImage {
    let (rows, cols) = snapshot.projection.dim();
    let raw = &snapshot.raw;
    let scaled_width = if raw.height() > 0 {
        (u64::from(raw.width()) * rows as u64 / u64::from(raw.height())).max(1) as u32
    } else {
        cols as u32
    };
    let left = imageops::resize(raw, scaled_width, rows as u32, imageops::FilterType::Triangle);

    let range = snapshot
        .projection
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let right = DynamicImage::ImageLuma8(to_gray(snapshot.projection.view(), range)).to_rgb8();

    let mut canvas = RgbImage::new(left.width() + right.width(), rows as u32);
    imageops::replace(&mut canvas, &left, 0, 0);
    imageops::replace(&mut canvas, &right, i64::from(left.width()), 0);
    canvas
}

pub fn save_first_frame_comparison(snapshot: &FirstFrameSnapshot, path: &Path) -> Result<()> {
    first_frame_comparison_image(snapshot)
        .save(path)
        .map_err(|e| PipelineError::EncodeError(format!("{}: {}", path.display(), e)))
}
