//! Model lifecycle and inference execution.
//!
//! The adapter owns a loaded model behind the `InferenceModel` trait and
//! tracks a small state machine: `Uninitialized -> Ready` on a successful
//! load, `Uninitialized -> Fallback` when the load fails. A load failure is
//! absorbed here (logged, reported via state) so callers that only check
//! readiness never see it as an error.

use image::RgbImage;

use crate::detect::decoder;
use crate::detect::source::DetectionSource;
use crate::detect::Detection;
use crate::error::DetectError;
use crate::preprocess::{self, InputTensor};

/// Raw detector output: four parallel tensors flattened to vectors.
///
/// `boxes` holds N rows of normalized `[y1, x1, y2, x2]`; `classes` and
/// `scores` hold N entries each; `valid_count` is the number of leading rows
/// that carry real detections (K <= N). Rows past K are padding and ignored.
#[derive(Clone, Debug, Default)]
pub struct RawOutputs {
    pub boxes: Vec<f32>,
    pub classes: Vec<f32>,
    pub scores: Vec<f32>,
    pub valid_count: usize,
}

/// A loaded inference model. Staging buffers must not outlive `predict`.
pub trait InferenceModel: Send {
    /// Runtime identifier, for logs.
    fn name(&self) -> &'static str;

    /// Run inference over a preprocessed input tensor.
    fn predict(&self, input: &InputTensor) -> Result<RawOutputs, DetectError>;
}

/// Acquires a model from a configured source (file path, registry, ...).
pub trait ModelLoader {
    fn load(&self) -> Result<Box<dyn InferenceModel>, DetectError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdapterState {
    Uninitialized,
    Ready,
    Fallback,
}

/// Owns the model lifecycle: load, ready-check, inference.
pub struct ModelAdapter {
    model: Option<Box<dyn InferenceModel>>,
    state: AdapterState,
}

impl ModelAdapter {
    pub fn new() -> Self {
        Self {
            model: None,
            state: AdapterState::Uninitialized,
        }
    }

    /// Attempt to acquire and prepare the model.
    ///
    /// Failure is absorbed: the adapter enters `Fallback` and the cause is
    /// logged, not propagated. Calling again on a `Ready` adapter is a no-op;
    /// calling again after `Fallback` re-attempts the load.
    pub fn initialize(&mut self, loader: &dyn ModelLoader) {
        if self.state == AdapterState::Ready {
            return;
        }
        match loader.load() {
            Ok(model) => {
                log::info!("inference model ready ({})", model.name());
                self.model = Some(model);
                self.state = AdapterState::Ready;
            }
            Err(e) => {
                log::warn!("model unavailable, detection will fall back to simulation: {e}");
                self.model = None;
                self.state = AdapterState::Fallback;
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == AdapterState::Ready
    }

    pub fn state(&self) -> AdapterState {
        self.state
    }

    /// Run inference. Fails with `DetectError::Inference` when the adapter is
    /// not `Ready` or the underlying runtime errors.
    pub fn predict(&self, input: &InputTensor) -> Result<RawOutputs, DetectError> {
        let model = self.model.as_ref().ok_or_else(|| {
            DetectError::Inference("predict called while adapter is not ready".to_string())
        })?;
        model.predict(input)
    }
}

impl Default for ModelAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Detection source backed by a real model: preprocess, predict, decode.
pub struct ModelBackedSource {
    adapter: ModelAdapter,
}

impl ModelBackedSource {
    /// Wrap a `Ready` adapter. The caller selects the simulated source
    /// instead when the adapter fell back.
    pub fn new(adapter: ModelAdapter) -> Self {
        Self { adapter }
    }
}

impl DetectionSource for ModelBackedSource {
    fn name(&self) -> &'static str {
        "model"
    }

    fn is_real(&self) -> bool {
        true
    }

    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>, DetectError> {
        let input = preprocess::preprocess(image);
        let raw = self.adapter.predict(&input)?;
        decoder::decode(&raw)
    }
}
