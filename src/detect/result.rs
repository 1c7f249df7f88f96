use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed vehicle taxonomy. Fixed at compile time, never extended at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleCategory {
    Car,
    Bus,
    Truck,
    Motorcycle,
    Bicycle,
    Van,
    Unknown,
}

impl VehicleCategory {
    /// Every category, in tally/display order.
    pub const ALL: [VehicleCategory; 7] = [
        VehicleCategory::Car,
        VehicleCategory::Bus,
        VehicleCategory::Truck,
        VehicleCategory::Motorcycle,
        VehicleCategory::Bicycle,
        VehicleCategory::Van,
        VehicleCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCategory::Car => "car",
            VehicleCategory::Bus => "bus",
            VehicleCategory::Truck => "truck",
            VehicleCategory::Motorcycle => "motorcycle",
            VehicleCategory::Bicycle => "bicycle",
            VehicleCategory::Van => "van",
            VehicleCategory::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounding box in pixel coordinates of the 320x320 analysis frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One classified, located vehicle observation from a single frame.
///
/// Created only by the decoder or the simulation generator; immutable after
/// creation; owned by the aggregation store once recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    /// Opaque id, unique within a session.
    pub id: String,
    pub category: VehicleCategory,
    /// Raw model score, in [0, 1].
    pub confidence: f32,
    pub bbox: BoundingBox,
    /// Placeholder identifier. NOT derived from any real plate recognition;
    /// carries no semantic guarantee.
    pub plate_guess: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl Detection {
    /// Build a detection with a fresh id, a placeholder plate string, and the
    /// current timestamp.
    pub fn new(category: VehicleCategory, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            category,
            confidence,
            bbox,
            plate_guess: Some(placeholder_plate(&mut rand::thread_rng())),
            observed_at: Utc::now(),
        }
    }
}

/// Generate a fake plate string ("ABC-123" shape). Placeholder data only.
pub fn placeholder_plate<R: Rng + ?Sized>(rng: &mut R) -> String {
    const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut plate = String::with_capacity(7);
    for _ in 0..3 {
        plate.push(LETTERS[rng.gen_range(0..LETTERS.len())] as char);
    }
    plate.push('-');
    for _ in 0..3 {
        plate.push(char::from_digit(rng.gen_range(0..10), 10).unwrap_or('0'));
    }
    plate
}
