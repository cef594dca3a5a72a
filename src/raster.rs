use image::{DynamicImage, Primitive};
use ndarray::{Array2, Array3, ArrayView3, Axis};
use nshare::AsNdarray3;
use num_traits::AsPrimitive;

use crate::errors::{Result, SpillError};

/// Rec.601 luma weights, matching the RGB→GRAY conversion the model was
/// trained against.
const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Decoded pixel data at the codec boundary.
///
/// Layout is `(height, width, channels)` with channels ∈ {1, 3, 4}. Sample
/// values are carried exactly as the decoder produced them — 0–255 for
/// 8-bit sources, 0–1 for float sources — so the normalizer can detect the
/// range itself. An alpha channel, when present, is ignored by every
/// downstream consumer.
pub struct RasterImage {
    data: Array3<f32>,
}

impl RasterImage {
    /// Wrap a decoded image. Grayscale-with-alpha drops to a single
    /// channel here; 16-bit and other exotic variants go through an RGB8
    /// conversion.
    pub fn from_dynamic(img: &DynamicImage) -> Result<Self> {
        let data = match img {
            DynamicImage::ImageLuma8(buf) => {
                interleaved(buf.as_raw(), buf.height(), buf.width(), 1)
            }
            DynamicImage::ImageLumaA8(_) => {
                let gray = img.to_luma8();
                interleaved(gray.as_raw(), gray.height(), gray.width(), 1)
            }
            DynamicImage::ImageRgb8(buf) => rgb_plane(buf.as_ndarray3()),
            DynamicImage::ImageRgba8(buf) => {
                interleaved(buf.as_raw(), buf.height(), buf.width(), 4)
            }
            DynamicImage::ImageRgb32F(buf) => rgb_plane(buf.as_ndarray3()),
            DynamicImage::ImageRgba32F(buf) => {
                interleaved(buf.as_raw(), buf.height(), buf.width(), 4)
            }
            other => {
                let rgb = other.to_rgb8();
                rgb_plane(rgb.as_ndarray3())
            }
        };
        Self::from_array(data)
    }

    /// Wrap an already-assembled `(H, W, C)` array.
    pub fn from_array(data: Array3<f32>) -> Result<Self> {
        let (h, w, c) = data.dim();
        if h == 0 || w == 0 {
            return Err(SpillError::InvalidImage {
                reason: format!("zero-sized image ({w}x{h})"),
            });
        }
        if !matches!(c, 1 | 3 | 4) {
            return Err(SpillError::InvalidImage {
                reason: format!("unsupported channel count: {c}"),
            });
        }
        Ok(Self { data })
    }

    pub fn width(&self) -> u32 {
        self.data.dim().1 as u32
    }

    pub fn height(&self) -> u32 {
        self.data.dim().0 as u32
    }

    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// Collapse to a single intensity channel. Alpha is dropped first;
    /// multi-channel data is weighted by Rec.601 luma, single-channel data
    /// passes through unchanged. Values keep their source range.
    pub fn luminance(&self) -> Array2<f32> {
        if self.channels() == 1 {
            return self.data.index_axis(Axis(2), 0).to_owned();
        }
        let r = self.data.index_axis(Axis(2), 0);
        let g = self.data.index_axis(Axis(2), 1);
        let b = self.data.index_axis(Axis(2), 2);
        &r * LUMA_WEIGHTS[0] + &g * LUMA_WEIGHTS[1] + &b * LUMA_WEIGHTS[2]
    }
}

/// Reorder an RGB buffer's `(3, H, W)` ndarray view into `(H, W, 3)` f32
/// samples.
fn rgb_plane<S>(view: ArrayView3<'_, S>) -> Array3<f32>
where
    S: Primitive + AsPrimitive<f32>,
{
    view.permuted_axes([1, 2, 0]).mapv(|v| v.as_())
}

/// Reshape an interleaved subpixel buffer into `(H, W, C)` f32 samples.
fn interleaved<S>(raw: &[S], height: u32, width: u32, channels: usize) -> Array3<f32>
where
    S: Primitive + AsPrimitive<f32>,
{
    let samples: Vec<f32> = raw.iter().map(|v| v.as_()).collect();
    Array3::from_shape_vec((height as usize, width as usize, channels), samples).unwrap()
}
