//! Outward-facing monitoring service.
//!
//! Owns the detection source and the aggregation store, and exposes the
//! whole pipeline behind one handle: detect a frame, query tallies and
//! history, reset, export. The source is chosen once at construction —
//! model-backed when a model loads, simulated otherwise — and model
//! problems never make construction fail.

use image::RgbImage;

use crate::config::MonitorConfig;
use crate::detect::{Detection, DetectionSource, SimulatedSource};
use crate::error::{DetectError, ExportError};
use crate::export;
use crate::store::{AggregationStore, CountSnapshot};

pub struct Monitor {
    source: Box<dyn DetectionSource>,
    store: AggregationStore,
}

impl Monitor {
    /// Build a monitor from configuration.
    ///
    /// When a model is configured and loads, detection is model-backed;
    /// when loading fails or no model is configured, detection degrades to
    /// the simulated source. Either way construction succeeds.
    pub fn open(cfg: &MonitorConfig) -> Self {
        let source = select_source(cfg);
        log::info!("detection source: {}", source.name());
        Self {
            source,
            store: AggregationStore::with_history_cap(cfg.history_cap),
        }
    }

    /// Build a monitor around an explicit source (tests, custom backends).
    pub fn with_source(source: Box<dyn DetectionSource>, history_cap: usize) -> Self {
        Self {
            source,
            store: AggregationStore::with_history_cap(history_cap),
        }
    }

    /// Run one detection cycle over a frame and record the results.
    ///
    /// A failed cycle surfaces its error and leaves counts and history
    /// untouched — no partial updates.
    pub fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>, DetectError> {
        let detections = self.source.detect(image)?;
        self.store.record(detections.iter().cloned());
        Ok(detections)
    }

    pub fn snapshot(&self) -> CountSnapshot {
        self.store.snapshot()
    }

    pub fn history(&self, limit: Option<usize>) -> Vec<Detection> {
        self.store.history(limit)
    }

    pub fn reset(&self) {
        self.store.reset();
    }

    pub fn export(&self) -> Result<String, ExportError> {
        export::export_json(&self.store)
    }

    pub fn is_real_model_active(&self) -> bool {
        self.source.is_real()
    }
}

fn select_source(cfg: &MonitorConfig) -> Box<dyn DetectionSource> {
    if let Some(model_path) = &cfg.model_path {
        #[cfg(feature = "backend-tract")]
        {
            use crate::detect::{ModelAdapter, ModelBackedSource, TractLoader};
            use crate::preprocess::{INPUT_HEIGHT, INPUT_WIDTH};

            let loader = TractLoader::new(model_path.clone(), INPUT_WIDTH, INPUT_HEIGHT);
            let mut adapter = ModelAdapter::new();
            adapter.initialize(&loader);
            if adapter.is_ready() {
                return Box::new(ModelBackedSource::new(adapter));
            }
        }
        #[cfg(not(feature = "backend-tract"))]
        {
            log::warn!(
                "model {} configured but built without backend-tract; using simulation",
                model_path.display()
            );
        }
    } else {
        log::info!("no model configured; using simulation");
    }

    match cfg.simulation_seed {
        Some(seed) => Box::new(SimulatedSource::with_seed(seed)),
        None => Box::new(SimulatedSource::new()),
    }
}
