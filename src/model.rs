use std::path::Path;

use ndarray::{s, Array2, Array4, ArrayView3, Axis, Ix4};
use ort::value::TensorRef;
use ort::{
    execution_providers::{CUDAExecutionProvider, TensorRTExecutionProvider},
    session::{builder::SessionBuilder, Session},
};
use parking_lot::Mutex;

use crate::errors::{Result, SpillError};
use crate::traits::SpillSegmentationModel;

/// ONNX Runtime backed segmentation model.
///
/// The session sits behind a mutex: the forward pass is not assumed
/// reentrant on a single accelerator, so concurrent requests serialize
/// here while the rest of the pipeline stays parallel. The exported
/// network emits logits; the sigmoid is applied before the probability
/// field leaves this module.
pub struct Model {
    canvas_size: u32,
    input_name: String,
    output_name: String,
    session: Mutex<Session>,
}

impl Model {
    /// Load the exported network and prime it with one zero-tensor run.
    /// The canvas size comes from the session's reported input shape;
    /// `fallback_canvas_size` covers graphs exported with dynamic spatial
    /// dims.
    pub fn load(model_path: &Path, device_id: i32, fallback_canvas_size: u32) -> Result<Self> {
        let mut session = SessionBuilder::new()
            .map_err(|e| SpillError::ModelUnavailable {
                operation: "session builder init".to_string(),
                source: Box::new(e),
            })?
            .with_execution_providers([
                TensorRTExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
            ])
            .map_err(|e| SpillError::ModelUnavailable {
                operation: "execution provider setup".to_string(),
                source: Box::new(e),
            })?
            .with_memory_pattern(true)
            .map_err(|e| SpillError::ModelUnavailable {
                operation: "memory pattern setup".to_string(),
                source: Box::new(e),
            })?
            .commit_from_file(model_path)
            .map_err(|e| SpillError::ModelUnavailable {
                operation: format!("model file load: {}", model_path.display()),
                source: Box::new(e),
            })?;

        let canvas_size = {
            let shape = session.inputs[0].input_type.tensor_shape().ok_or_else(|| {
                SpillError::ModelUnavailable {
                    operation: "model input shape query".to_string(),
                    source: Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "input is not a tensor",
                    )),
                }
            })?;
            match shape.get(2) {
                Some(&dim) if dim > 0 => dim as u32,
                _ => fallback_canvas_size,
            }
        };

        let input_name = session.inputs[0].name.clone();
        let output_name = session.outputs[0].name.clone();

        // warm-up run
        let size = canvas_size as usize;
        let data = Array4::<f32>::zeros((1, 3, size, size));
        session
            .run(ort::inputs![input_name.as_str() => TensorRef::from_array_view(&data).map_err(
                |e| SpillError::ModelUnavailable {
                    operation: "warm-up tensor creation".to_string(),
                    source: Box::new(e),
                },
            )?])
            .map_err(|e| SpillError::ModelUnavailable {
                operation: "warm-up run".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            canvas_size,
            input_name,
            output_name,
            session: Mutex::new(session),
        })
    }
}

impl SpillSegmentationModel for Model {
    fn canvas_size(&self) -> u32 {
        self.canvas_size
    }

    fn infer(&self, tensor: ArrayView3<'_, f32>) -> Result<Array2<f32>> {
        let batched = tensor.insert_axis(Axis(0));
        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![
            self.input_name.as_str() => TensorRef::from_array_view(&batched.as_standard_layout())?
        ])?;

        let logits = outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix4>()?;

        Ok(logits
            .slice(s![0, 0, .., ..])
            .mapv(|v| 1.0 / (1.0 + (-v).exp())))
    }
}
