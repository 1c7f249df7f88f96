//! Vehicle detection and tally core.
//!
//! The pipeline takes a decoded image, runs an object-detection model over
//! it, filters and classifies the raw output into a fixed vehicle taxonomy,
//! and keeps a running tally plus a bounded history of what it saw.
//!
//! # Module Structure
//!
//! - `preprocess`: image -> fixed 320x320 normalized input tensor
//! - `detect`: model adapter, raw-output decoder, simulated fallback source
//! - `store`: running per-category counts and bounded detection history
//! - `export`: JSON snapshot of counts + history
//! - `monitor`: the outward facade driving one detection cycle at a time
//! - `config`: JSON file + env configuration for the daemon
//!
//! The two detection producers (model-backed and simulated) share the
//! `DetectionSource` trait, selected once when a `Monitor` is built. A model
//! that fails to load degrades to simulation; it never takes the service
//! down.

pub mod config;
pub mod detect;
pub mod error;
pub mod export;
pub mod monitor;
pub mod preprocess;
pub mod store;

pub use config::MonitorConfig;
pub use detect::{
    decode, AdapterState, BoundingBox, Detection, DetectionSource, InferenceModel, ModelAdapter,
    ModelBackedSource, ModelLoader, RawOutputs, SimulatedSource, VehicleCategory,
    CONFIDENCE_THRESHOLD,
};
pub use error::{DetectError, ExportError};
pub use export::{export_json, ExportSnapshot};
pub use monitor::Monitor;
pub use preprocess::{preprocess, InputTensor, INPUT_HEIGHT, INPUT_WIDTH};
pub use store::{AggregationStore, CountSnapshot, DEFAULT_HISTORY_CAP};

#[cfg(feature = "backend-tract")]
pub use detect::{TractLoader, TractModel};
