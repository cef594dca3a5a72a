use image::{DynamicImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use ndarray::{Array2, ArrayView3};

use spillguard_rs::mocks::FieldMockModel;
use spillguard_rs::{Detector, RasterImage, Result, Severity, SpillSegmentationModel};

// テスト用のモックモデル（統合テスト内で定義）
#[derive(Debug, Clone)]
struct TestMockModel {
    canvas_size: u32,
    probability: f32,
}

impl TestMockModel {
    const fn new(canvas_size: u32, probability: f32) -> Self {
        Self {
            canvas_size,
            probability,
        }
    }
}

impl SpillSegmentationModel for TestMockModel {
    fn canvas_size(&self) -> u32 {
        self.canvas_size
    }

    fn infer(&self, _tensor: ArrayView3<'_, f32>) -> Result<Array2<f32>> {
        let size = self.canvas_size as usize;
        Ok(Array2::from_elem((size, size), self.probability))
    }
}

fn mid_gray_raster(width: u32, height: u32) -> RasterImage {
    let img = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(width, height, Luma([128])));
    RasterImage::from_dynamic(&img).unwrap()
}

#[test]
fn test_untrained_model_finds_nothing() -> Result<()> {
    // 一様なグレー画像＋ゼロ出力モデル → 検出なし
    let detector = Detector::new(TestMockModel::new(512, 0.0), 0.65);
    let detection = detector.detect(&mid_gray_raster(100, 100))?;

    assert!(detection.mask.iter().all(|&m| m == 0));
    assert_eq!(detection.stats.oil_percentage, 0.0);
    assert!(!detection.is_spill);
    Ok(())
}

#[test]
fn test_result_resolution_matches_input_not_canvas() -> Result<()> {
    let detector = Detector::new(TestMockModel::new(512, 0.9), 0.65);
    let detection = detector.detect(&mid_gray_raster(321, 123))?;

    assert_eq!(detection.mask.dim(), (123, 321));
    assert_eq!(detection.overlay.dimensions(), (321, 123));
    Ok(())
}

#[test]
fn test_half_coverage_scenario() -> Result<()> {
    // 左半分のみ高確率の確率場（キャンバス＝入力解像度）
    let field = Array2::from_shape_fn((64, 64), |(_, x)| if x < 32 { 0.9 } else { 0.1 });
    let detector = Detector::new(FieldMockModel::new(field), 0.65);
    let detection = detector.detect(&mid_gray_raster(64, 64))?;

    assert_eq!(detection.stats.oil_pixels, 2048);
    assert_eq!(detection.stats.oil_percentage, 50.0);
    assert!(detection.is_spill);
    assert_eq!(detection.severity, Severity::High);
    Ok(())
}

#[test]
fn test_alpha_channel_is_ignored_end_to_end() -> Result<()> {
    let mut rgb = RgbImage::new(48, 36);
    let mut rgba = RgbaImage::new(48, 36);
    for y in 0..36 {
        for x in 0..48 {
            let v = ((x * 11 + y * 5) % 256) as u8;
            rgb.put_pixel(x, y, Rgb([v, 255 - v, v / 3]));
            rgba.put_pixel(x, y, Rgba([v, 255 - v, v / 3, ((x + y) % 256) as u8]));
        }
    }

    let detector = Detector::new(TestMockModel::new(64, 0.8), 0.65);
    let plain = detector.detect(&RasterImage::from_dynamic(&DynamicImage::ImageRgb8(rgb))?)?;
    let with_alpha =
        detector.detect(&RasterImage::from_dynamic(&DynamicImage::ImageRgba8(rgba))?)?;

    assert_eq!(plain.mask, with_alpha.mask);
    assert_eq!(plain.stats.oil_pixels, with_alpha.stats.oil_pixels);
    assert_eq!(plain.overlay.as_raw(), with_alpha.overlay.as_raw());
    Ok(())
}

#[test]
fn test_report_payload_shape() -> Result<()> {
    let detector = Detector::new(TestMockModel::new(32, 0.9), 0.65);
    let detection = detector.detect(&mid_gray_raster(20, 20))?;

    let json = serde_json::to_value(detection.report()).unwrap();
    assert_eq!(json["is_spill"], true);
    assert_eq!(json["oil_percentage"], 100.0);
    assert_eq!(json["severity"], "HIGH");
    assert_eq!(json["details"]["total_pixels"], 400);
    assert_eq!(json["details"]["oil_pixels"], 400);
    assert!(json["details"]["threshold"].is_number());
    assert!(json["max_confidence"].is_number());
    assert!(json["mean_probability"].is_number());
    Ok(())
}

#[test]
fn test_overlay_saves_through_the_codec_boundary() -> Result<()> {
    use tempfile::TempDir;

    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().join("overlay.png");

    let detector = Detector::new(TestMockModel::new(32, 0.9), 0.65);
    let detection = detector.detect(&mid_gray_raster(25, 15))?;

    detection.overlay.save(&output_path).unwrap();
    assert!(output_path.exists());

    let reloaded = image::open(&output_path).unwrap();
    assert_eq!(reloaded.width(), 25);
    assert_eq!(reloaded.height(), 15);
    Ok(())
}

#[test]
fn test_zero_sized_input_is_rejected() {
    let img = DynamicImage::new_rgb8(0, 0);
    let result = RasterImage::from_dynamic(&img);
    assert!(result.is_err());
}
