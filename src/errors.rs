use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for the oil spill detection pipeline.
///
/// Variants follow the failure domains a caller can meaningfully react to:
/// rejecting the input image, reporting the model as unavailable, or
/// surfacing an inference failure. The thiserror crate generates Display
/// implementations from the format strings.
#[derive(Error, Debug)]
pub enum SpillError {
    /// The input image is malformed, zero-sized, or undecodable.
    /// Terminal for the request; never retried.
    #[error("invalid image: {reason}")]
    InvalidImage { reason: String },

    /// The segmentation model failed to load or is not initialized.
    /// Every detection request fails with this until resolved externally.
    #[error("model unavailable: {operation} failed")]
    ModelUnavailable {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The forward pass raised an error or returned an unusable output.
    /// Assumed deterministic for a given input; never retried.
    #[error("inference failed: {operation}")]
    Inference {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {message}")]
    Configuration { message: String },
}

pub type Result<T> = std::result::Result<T, SpillError>;

/// Convert I/O errors to filesystem errors.
///
/// Code that has path/operation context should construct
/// `SpillError::FileSystem` directly; this conversion is the fallback for
/// callsites without it.
impl From<std::io::Error> for SpillError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("unknown"),
            operation: "unknown".to_string(),
            source: err,
        }
    }
}

/// Convert image crate errors to invalid-image errors.
///
/// Decode and buffer-construction failures all mean the same thing to the
/// caller: this input cannot be processed.
impl From<image::ImageError> for SpillError {
    fn from(err: image::ImageError) -> Self {
        Self::InvalidImage {
            reason: err.to_string(),
        }
    }
}

/// Convert ONNX Runtime errors raised during a forward pass.
///
/// Load-time ort errors are wrapped as `ModelUnavailable` at the callsite,
/// where the failing operation is known; anything reaching this blanket
/// conversion happened while running the session.
impl From<ort::Error> for SpillError {
    fn from(err: ort::Error) -> Self {
        Self::Inference {
            operation: "session run".to_string(),
            source: Box::new(err),
        }
    }
}

/// Convert ndarray shape errors to inference errors.
///
/// Shape errors occur when reshaping the session output into the expected
/// probability field, which is part of the inference contract.
impl From<ndarray::ShapeError> for SpillError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::Inference {
            operation: "tensor shape conversion".to_string(),
            source: Box::new(err),
        }
    }
}
