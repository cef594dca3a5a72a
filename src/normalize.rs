use image::imageops::FilterType;
use ndarray::{Array2, Array3, Axis};

use crate::errors::{Result, SpillError};
use crate::fieldops::{pad_to_square, percentile, resample};
use crate::raster::RasterImage;

/// Square canvas resolution the segmentation network consumes.
pub const DEFAULT_CANVAS_SIZE: u32 = 512;

const STRETCH_EPSILON: f32 = 1e-6;
const STRETCH_LOW_PERCENTILE: f32 = 1.0;
const STRETCH_HIGH_PERCENTILE: f32 = 99.0;

/// Model-ready input plus the original-resolution intensity field it was
/// derived from.
pub struct Normalized {
    /// Channel-first `(3, S, S)` tensor in [0,1]; the three planes are
    /// bit-identical copies of one intensity field.
    pub tensor: Array3<f32>,
    /// Contrast-stretched field at the source resolution, for callers that
    /// need original-resolution grayscale context.
    pub intensity: Array2<f32>,
}

/// Convert an arbitrary raster into the fixed-size tensor the network
/// expects: luma → [0,1] scaling → percentile stretch → aspect-preserving
/// cubic resize (longer side = canvas) → centered reflect padding →
/// three-plane replication.
pub fn normalize(image: &RasterImage, canvas_size: u32) -> Result<Normalized> {
    if canvas_size == 0 {
        return Err(SpillError::Configuration {
            message: "canvas size must be positive".to_string(),
        });
    }

    let mut field = image.luminance();

    // Any sample above 1.0 means the decoder handed over 8-bit range.
    let peak = field.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if peak > 1.0 {
        field.mapv_inplace(|v| v / 255.0);
    }

    let field = stretch(field);

    let (w, h) = (image.width(), image.height());
    let scale = canvas_size as f32 / w.max(h) as f32;
    let new_w = ((w as f32 * scale).round() as u32).max(1);
    let new_h = ((h as f32 * scale).round() as u32).max(1);

    let resized = resample(&field, new_w, new_h, FilterType::CatmullRom);
    let padded = pad_to_square(&resized, canvas_size);

    let size = canvas_size as usize;
    let tensor = padded
        .insert_axis(Axis(0))
        .broadcast((3, size, size))
        .unwrap()
        .to_owned();

    Ok(Normalized {
        tensor,
        intensity: field,
    })
}

/// Percentile contrast stretch. Clips to the 1st/99th percentiles and
/// rescales to [0,1]; a flat field falls back to min/peak-to-peak so the
/// denominator never reaches zero.
fn stretch(mut field: Array2<f32>) -> Array2<f32> {
    let mut samples: Vec<f32> = field.iter().copied().collect();
    let lo = percentile(&mut samples, STRETCH_LOW_PERCENTILE);
    let hi = percentile(&mut samples, STRETCH_HIGH_PERCENTILE);

    if hi > lo {
        let span = (hi - lo).max(STRETCH_EPSILON);
        field.mapv_inplace(|v| (v.clamp(lo, hi) - lo) / span);
    } else {
        let min = field.iter().copied().fold(f32::INFINITY, f32::min);
        let max = field.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let span = (max - min) + STRETCH_EPSILON;
        field.mapv_inplace(|v| (v - min) / span);
    }
    field
}
