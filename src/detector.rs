use crate::errors::{Result, SpillError};
use crate::normalize::normalize;
use crate::postprocess::{postprocess, Detection};
use crate::raster::RasterImage;
use crate::traits::SpillSegmentationModel;

/// Detection entry point: a loaded model paired with its default decision
/// threshold. Constructed once at process start and immutable afterwards;
/// every request runs Normalizer → inference → Postprocessor with no
/// shared mutable state.
pub struct Detector<M: SpillSegmentationModel> {
    model: M,
    threshold: f32,
}

impl<M: SpillSegmentationModel> Detector<M> {
    pub const fn new(model: M, threshold: f32) -> Self {
        Self { model, threshold }
    }

    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn canvas_size(&self) -> u32 {
        self.model.canvas_size()
    }

    /// Run detection with the context's default threshold.
    pub fn detect(&self, image: &RasterImage) -> Result<Detection> {
        self.detect_with_threshold(image, self.threshold)
    }

    /// Run detection with a caller-supplied threshold.
    pub fn detect_with_threshold(&self, image: &RasterImage, threshold: f32) -> Result<Detection> {
        let canvas_size = self.model.canvas_size();
        let normalized = normalize(image, canvas_size)?;

        let prob = self.model.infer(normalized.tensor.view())?;

        let size = canvas_size as usize;
        if prob.dim() != (size, size) {
            return Err(SpillError::Inference {
                operation: "probability field shape check".to_string(),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("expected {size}x{size}, got {:?}", prob.dim()),
                )),
            });
        }

        postprocess(&prob, image, threshold)
    }
}

// ONNXバックエンドを設定から組み立てるコンストラクタ（非ジェネリック）
impl Detector<crate::model::Model> {
    pub fn with_onnx_model(config: &crate::config::Config) -> Result<Self> {
        let model =
            crate::model::Model::load(&config.model_path, config.device_id, config.canvas_size)?;
        Ok(Self::new(model, config.threshold))
    }
}
