use image::{imageops, ImageBuffer, Luma};
use ndarray::Array2;

/// Resample a single-channel f32 field to the requested dimensions with the
/// given filter, round-tripping through an `ImageBuffer` so the image
/// crate's separable kernels do the work.
pub fn resample(
    field: &Array2<f32>,
    width: u32,
    height: u32,
    filter: imageops::FilterType,
) -> Array2<f32> {
    let (h, w) = field.dim();
    if (h as u32, w as u32) == (height, width) {
        return field.clone();
    }

    let raw = field.as_standard_layout().into_owned().into_raw_vec_and_offset().0;
    let buffer: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_raw(w as u32, h as u32, raw).unwrap();
    let resized = imageops::resize(&buffer, width, height, filter);

    Array2::from_shape_vec((height as usize, width as usize), resized.into_raw()).unwrap()
}
