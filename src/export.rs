//! Tally export serialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detect::Detection;
use crate::error::ExportError;
use crate::store::{AggregationStore, CountSnapshot};

/// Portable snapshot of a session: tallies, full retained history, and the
/// export timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSnapshot {
    pub counts: CountSnapshot,
    pub detections: Vec<Detection>,
    pub exported_at: DateTime<Utc>,
}

impl ExportSnapshot {
    /// Capture the store's current state, stamped with the current time.
    pub fn capture(store: &AggregationStore) -> Self {
        Self {
            counts: store.snapshot(),
            detections: store.history(None),
            exported_at: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Serialize the store's current state to the export JSON shape.
pub fn export_json(store: &AggregationStore) -> Result<String, ExportError> {
    ExportSnapshot::capture(store).to_json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BoundingBox, VehicleCategory};

    #[test]
    fn export_embeds_counts_history_and_timestamp() {
        let store = AggregationStore::new();
        store.record(vec![Detection::new(
            VehicleCategory::Car,
            0.92,
            BoundingBox {
                x: 12.0,
                y: 8.0,
                width: 60.0,
                height: 44.0,
            },
        )]);

        let json = export_json(&store).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["counts"]["car"], 1);
        assert_eq!(value["counts"]["total"], 1);
        assert_eq!(value["detections"][0]["category"], "car");
        assert_eq!(value["detections"][0]["bbox"]["width"], 60.0);
        assert!(value["detections"][0]["plateGuess"].is_string());
        assert!(value["detections"][0]["observedAt"].is_string());
        assert!(value["exportedAt"].is_string());
    }
}
