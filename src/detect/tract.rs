//! ONNX inference through tract.
//!
//! Loads an SSD-style detector from disk and runs it over the 320x320
//! analysis frame. The model is expected to emit the four standard
//! post-processed outputs: boxes, classes, scores, valid count.

use std::path::{Path, PathBuf};

use tract_onnx::prelude::*;

use crate::detect::adapter::{InferenceModel, ModelLoader, RawOutputs};
use crate::error::DetectError;
use crate::preprocess::InputTensor;

/// A tract-backed detector plan.
pub struct TractModel {
    plan: SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>,
    width: u32,
    height: u32,
}

impl TractModel {
    /// Load an ONNX model from disk and prepare it for 320x320 NHWC input.
    pub fn load<P: AsRef<Path>>(model_path: P, width: u32, height: u32) -> Result<Self, DetectError> {
        let model_path = model_path.as_ref();
        let plan = tract_onnx::onnx()
            .model_for_path(model_path)
            .map_err(|e| {
                DetectError::ModelLoad(format!(
                    "failed to read ONNX model from {}: {e}",
                    model_path.display()
                ))
            })?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, height as usize, width as usize, 3),
                ),
            )
            .map_err(|e| DetectError::ModelLoad(format!("failed to set input fact: {e}")))?
            .into_optimized()
            .map_err(|e| DetectError::ModelLoad(format!("failed to optimize model: {e}")))?
            .into_runnable()
            .map_err(|e| DetectError::ModelLoad(format!("failed to build runnable model: {e}")))?;

        Ok(Self {
            plan,
            width,
            height,
        })
    }

    fn build_input(&self, input: &InputTensor) -> Result<Tensor, DetectError> {
        if input.width != self.width || input.height != self.height {
            return Err(DetectError::Inference(format!(
                "input {}x{} does not match model input {}x{}",
                input.width, input.height, self.width, self.height
            )));
        }
        let shape = (1, self.height as usize, self.width as usize, 3);
        let array = tract_ndarray::Array4::from_shape_vec(shape, input.data.clone())
            .map_err(|e| DetectError::Inference(format!("input tensor shape mismatch: {e}")))?;
        Ok(array.into_tensor())
    }

    fn output_values(outputs: &TVec<TValue>, index: usize) -> Result<Vec<f32>, DetectError> {
        let tensor = outputs
            .get(index)
            .ok_or_else(|| DetectError::Inference(format!("model produced no output {index}")))?;
        let view = tensor
            .to_array_view::<f32>()
            .map_err(|e| DetectError::Inference(format!("output {index} was not f32: {e}")))?;
        Ok(view.iter().copied().collect())
    }
}

impl InferenceModel for TractModel {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn predict(&self, input: &InputTensor) -> Result<RawOutputs, DetectError> {
        let tensor = self.build_input(input)?;
        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| DetectError::Inference(format!("ONNX inference failed: {e}")))?;

        let boxes = Self::output_values(&outputs, 0)?;
        let classes = Self::output_values(&outputs, 1)?;
        let scores = Self::output_values(&outputs, 2)?;
        let valid = Self::output_values(&outputs, 3)?;
        let valid_count = valid.first().copied().unwrap_or(0.0).max(0.0) as usize;

        Ok(RawOutputs {
            boxes,
            classes,
            scores,
            valid_count,
        })
    }
}

/// Loads a `TractModel` from a configured file path.
pub struct TractLoader {
    path: PathBuf,
    width: u32,
    height: u32,
}

impl TractLoader {
    pub fn new<P: Into<PathBuf>>(path: P, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width,
            height,
        }
    }
}

impl ModelLoader for TractLoader {
    fn load(&self) -> Result<Box<dyn InferenceModel>, DetectError> {
        let model = TractModel::load(&self.path, self.width, self.height)?;
        Ok(Box::new(model))
    }
}
