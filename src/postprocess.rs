use image::{imageops::FilterType, RgbImage};
use ndarray::Array2;
use serde::Serialize;

use crate::errors::Result;
use crate::fieldops::resample;
use crate::raster::RasterImage;

/// Default probability cutoff above which a pixel counts as oil.
pub const DEFAULT_THRESHOLD: f32 = 0.65;

/// Coverage (percent) above which the image is flagged as a spill. Fixed
/// policy, independent of the detection threshold.
const SPILL_POLICY_PERCENTAGE: f64 = 1.0;

/// Overlay blend weights: grayscale base vs highlighted copy.
const BLEND_BASE: f32 = 0.7;
const BLEND_HIGHLIGHT: f32 = 0.3;
const HIGHLIGHT_COLOR: [f32; 3] = [255.0, 0.0, 0.0];

/// Coverage-derived severity grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Moderate,
    Low,
    Minimal,
}

impl Severity {
    pub fn from_coverage(oil_percentage: f64) -> Self {
        if oil_percentage > 10.0 {
            Self::High
        } else if oil_percentage > 5.0 {
            Self::Moderate
        } else if oil_percentage > 1.0 {
            Self::Low
        } else {
            Self::Minimal
        }
    }
}

/// Scalar statistics over the original-resolution probability field.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CoverageStats {
    pub oil_pixels: u64,
    pub total_pixels: u64,
    pub oil_percentage: f64,
    pub max_confidence: f32,
    pub mean_probability: f32,
}

/// Result of one detection request. Constructed once, returned to the
/// caller, never retained by the pipeline.
pub struct Detection {
    /// Binary mask at the original resolution, values {0, 1}.
    pub mask: Array2<u8>,
    pub stats: CoverageStats,
    pub is_spill: bool,
    pub severity: Severity,
    /// Grayscale-plus-red-highlight composite at the original resolution.
    pub overlay: RgbImage,
    /// Detection threshold this result was computed with.
    pub threshold: f32,
}

impl Detection {
    /// Framework-agnostic response payload (the overlay travels separately
    /// through the codec boundary).
    pub fn report(&self) -> DetectionReport {
        DetectionReport {
            is_spill: self.is_spill,
            oil_percentage: self.stats.oil_percentage,
            max_confidence: self.stats.max_confidence,
            mean_probability: self.stats.mean_probability,
            severity: self.severity,
            details: ReportDetails {
                threshold: self.threshold,
                oil_pixels: self.stats.oil_pixels,
                total_pixels: self.stats.total_pixels,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DetectionReport {
    pub is_spill: bool,
    pub oil_percentage: f64,
    pub max_confidence: f32,
    pub mean_probability: f32,
    pub severity: Severity,
    pub details: ReportDetails,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReportDetails {
    pub threshold: f32,
    pub oil_pixels: u64,
    pub total_pixels: u64,
}

/// Convert the canvas-resolution probability field into the final
/// detection: linear resample back to the source resolution, threshold,
/// statistics, and overlay rendering.
///
/// Linear resampling cannot leave the input range; the field is not
/// re-clamped.
pub fn postprocess(
    prob_canvas: &Array2<f32>,
    image: &RasterImage,
    threshold: f32,
) -> Result<Detection> {
    let prob = resample(
        prob_canvas,
        image.width(),
        image.height(),
        FilterType::Triangle,
    );

    let mask = threshold_mask(&prob, threshold);
    let stats = coverage(&prob, &mask);
    let is_spill = stats.oil_percentage > SPILL_POLICY_PERCENTAGE;
    let severity = Severity::from_coverage(stats.oil_percentage);
    let overlay = render_overlay(image, &mask);

    Ok(Detection {
        mask,
        stats,
        is_spill,
        severity,
        overlay,
        threshold,
    })
}

/// Binary decision per pixel: 1 where probability ≥ threshold.
pub fn threshold_mask(prob: &Array2<f32>, threshold: f32) -> Array2<u8> {
    prob.mapv(|p| u8::from(p >= threshold))
}

/// Coverage statistics for a probability field and its decision mask.
pub fn coverage(prob: &Array2<f32>, mask: &Array2<u8>) -> CoverageStats {
    let total_pixels = mask.len() as u64;
    let oil_pixels = mask.iter().filter(|&&m| m == 1).count() as u64;
    let oil_percentage = if total_pixels > 0 {
        100.0 * oil_pixels as f64 / total_pixels as f64
    } else {
        0.0
    };

    let max_confidence = prob.iter().copied().fold(0.0_f32, f32::max);
    let mean_probability = if prob.is_empty() {
        0.0
    } else {
        prob.sum() / prob.len() as f32
    };

    CoverageStats {
        oil_pixels,
        total_pixels,
        oil_percentage,
        max_confidence,
        mean_probability,
    }
}

/// Grayscale base blended 0.7/0.3 with a copy whose detected pixels are
/// replaced by pure red.
fn render_overlay(image: &RasterImage, mask: &Array2<u8>) -> RgbImage {
    let luma = image.luminance();
    let peak = luma.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let scale = if peak > 1.0 { 1.0 } else { 255.0 };

    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let gray = (luma[(y as usize, x as usize)] * scale).clamp(0.0, 255.0);
        let channels = if mask[(y as usize, x as usize)] == 1 {
            [
                BLEND_BASE * gray + BLEND_HIGHLIGHT * HIGHLIGHT_COLOR[0],
                BLEND_BASE * gray + BLEND_HIGHLIGHT * HIGHLIGHT_COLOR[1],
                BLEND_BASE * gray + BLEND_HIGHLIGHT * HIGHLIGHT_COLOR[2],
            ]
        } else {
            [gray, gray, gray]
        };
        image::Rgb(channels.map(|c| c.round() as u8))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Luma};
    use ndarray::Array3;

    fn gray_raster(width: u32, height: u32, value: u8) -> RasterImage {
        let img = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(
            width,
            height,
            Luma([value]),
        ));
        RasterImage::from_dynamic(&img).unwrap()
    }

    fn field_with_fraction(total: usize, high: usize) -> Array2<f32> {
        Array2::from_shape_fn((total / 100, 100), |(y, x)| {
            if y * 100 + x < high {
                0.9
            } else {
                0.1
            }
        })
    }

    #[test]
    fn exact_five_percent_coverage() {
        let prob = field_with_fraction(10_000, 500);
        let mask = threshold_mask(&prob, 0.65);
        let stats = coverage(&prob, &mask);

        assert_eq!(stats.oil_pixels, 500);
        assert_eq!(stats.total_pixels, 10_000);
        assert_eq!(stats.oil_percentage, 5.0);
        assert!(stats.oil_percentage > SPILL_POLICY_PERCENTAGE);
        assert_eq!(Severity::from_coverage(stats.oil_percentage), Severity::Low);
    }

    #[test]
    fn coverage_is_monotone_in_threshold() {
        let prob = Array2::from_shape_fn((50, 50), |(y, x)| ((y * 50 + x) % 100) as f32 / 100.0);

        let mut previous = f64::INFINITY;
        for threshold in [0.1, 0.3, 0.5, 0.7, 0.9] {
            let mask = threshold_mask(&prob, threshold);
            let stats = coverage(&prob, &mask);
            assert!(
                stats.oil_percentage <= previous,
                "coverage increased at threshold {threshold}"
            );
            previous = stats.oil_percentage;
        }
    }

    #[test]
    fn spill_flag_follows_the_fixed_policy() {
        // Exactly 1% is not a spill; the policy is strictly greater.
        let prob = field_with_fraction(10_000, 100);
        let detection = postprocess(&prob, &gray_raster(100, 100, 90), 0.65).unwrap();
        assert_eq!(detection.stats.oil_percentage, 1.0);
        assert!(!detection.is_spill);

        let prob = field_with_fraction(10_000, 101);
        let detection = postprocess(&prob, &gray_raster(100, 100, 90), 0.65).unwrap();
        assert!(detection.is_spill);
    }

    #[test]
    fn spill_flag_is_independent_of_detection_threshold() {
        let prob = field_with_fraction(10_000, 2_000);
        // Same field, two thresholds below 0.9: the flag tracks coverage,
        // not the cutoff.
        for threshold in [0.2, 0.65] {
            let detection = postprocess(&prob, &gray_raster(100, 100, 90), threshold).unwrap();
            assert!(detection.is_spill);
        }
    }

    #[test]
    fn max_and_mean_reflect_the_field() {
        let mut prob = Array2::from_elem((10, 10), 0.25_f32);
        prob[(3, 4)] = 0.75;
        let mask = threshold_mask(&prob, 0.5);
        let stats = coverage(&prob, &mask);

        assert_eq!(stats.max_confidence, 0.75);
        let expected_mean = (0.25 * 99.0 + 0.75) / 100.0;
        assert!((stats.mean_probability - expected_mean).abs() < 1e-6);
    }

    #[test]
    fn overlay_matches_original_dimensions_not_canvas() {
        let prob = Array2::from_elem((64, 64), 0.9_f32);
        let detection = postprocess(&prob, &gray_raster(120, 75, 100), 0.65).unwrap();
        assert_eq!(detection.overlay.dimensions(), (120, 75));
        assert_eq!(detection.mask.dim(), (75, 120));
    }

    #[test]
    fn overlay_highlights_detected_pixels_in_red() {
        let prob = Array2::from_elem((32, 32), 0.9_f32);
        let raster = gray_raster(32, 32, 100);
        let detection = postprocess(&prob, &raster, 0.65).unwrap();

        // gray 100 → 0.7 * 100 + 0.3 * 255 in red, 0.7 * 100 elsewhere
        let pixel = detection.overlay.get_pixel(10, 10);
        assert_eq!(pixel.0, [147, 70, 70]);
    }

    #[test]
    fn overlay_preserves_grayscale_where_nothing_is_detected() {
        let prob = Array2::from_elem((32, 32), 0.1_f32);
        let raster = gray_raster(32, 32, 100);
        let detection = postprocess(&prob, &raster, 0.65).unwrap();

        let pixel = detection.overlay.get_pixel(5, 5);
        assert_eq!(pixel.0, [100, 100, 100]);
    }

    #[test]
    fn float_range_raster_scales_overlay_to_eight_bit() {
        let data = Array3::from_elem((16, 16, 1), 0.5_f32);
        let raster = RasterImage::from_array(data).unwrap();
        let prob = Array2::from_elem((16, 16), 0.0_f32);
        let detection = postprocess(&prob, &raster, 0.65).unwrap();

        let pixel = detection.overlay.get_pixel(0, 0);
        assert_eq!(pixel.0, [128, 128, 128]);
    }

    #[test]
    fn severity_grades_follow_coverage_bands() {
        assert_eq!(Severity::from_coverage(0.5), Severity::Minimal);
        assert_eq!(Severity::from_coverage(1.0), Severity::Minimal);
        assert_eq!(Severity::from_coverage(3.0), Severity::Low);
        assert_eq!(Severity::from_coverage(7.5), Severity::Moderate);
        assert_eq!(Severity::from_coverage(42.0), Severity::High);
    }

    #[test]
    fn report_carries_the_request_threshold() {
        let prob = Array2::from_elem((16, 16), 0.9_f32);
        let detection = postprocess(&prob, &gray_raster(16, 16, 50), 0.42).unwrap();
        let report = detection.report();

        assert!(report.is_spill);
        assert_eq!(report.details.threshold, 0.42);
        assert_eq!(report.details.total_pixels, 256);
        assert_eq!(report.oil_percentage, 100.0);
    }
}
