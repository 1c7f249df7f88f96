mod adapter;
mod decoder;
mod result;
mod simulated;
mod source;

#[cfg(feature = "backend-tract")]
mod tract;

pub use adapter::{
    AdapterState, InferenceModel, ModelAdapter, ModelBackedSource, ModelLoader, RawOutputs,
};
pub use decoder::{decode, CONFIDENCE_THRESHOLD};
pub use result::{placeholder_plate, BoundingBox, Detection, VehicleCategory};
pub use simulated::SimulatedSource;
pub use source::DetectionSource;

#[cfg(feature = "backend-tract")]
pub use tract::{TractLoader, TractModel};
