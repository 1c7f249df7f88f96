use thiserror::Error;

/// Failures raised along the detection path.
///
/// `ModelLoad` is absorbed by `ModelAdapter::initialize` (the adapter falls
/// back to simulation instead of propagating); the other variants surface to
/// the caller of `detect`/`predict`.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("model load failed: {0}")]
    ModelLoad(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("malformed model output: {0}")]
    Decode(String),
}

/// Failures serializing a tally export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
