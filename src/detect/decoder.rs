//! Decodes raw detector output into vehicle detections.
//!
//! The detector emits four parallel tensors per frame (boxes, classes,
//! scores, valid count). Decoding walks the first K rows, resolves each
//! class index through the 90-entry COCO label table, keeps only confident
//! vehicle classes, and converts normalized box corners into pixel
//! coordinates of the 320x320 analysis frame.

use crate::detect::adapter::RawOutputs;
use crate::detect::result::{BoundingBox, Detection, VehicleCategory};
use crate::error::DetectError;
use crate::preprocess::{INPUT_HEIGHT, INPUT_WIDTH};

/// A candidate must score strictly above this to be retained.
pub const CONFIDENCE_THRESHOLD: f32 = 0.3;

/// COCO label table as shipped with SSD-style detectors: 90 slots, some of
/// them holes (`None`) where the dataset reserves an index with no class.
const COCO_LABELS: [Option<&str>; 90] = [
    Some("person"),
    Some("bicycle"),
    Some("car"),
    Some("motorcycle"),
    Some("airplane"),
    Some("bus"),
    Some("train"),
    Some("truck"),
    Some("boat"),
    Some("traffic light"),
    Some("fire hydrant"),
    None,
    Some("stop sign"),
    Some("parking meter"),
    Some("bench"),
    Some("bird"),
    Some("cat"),
    Some("dog"),
    Some("horse"),
    Some("sheep"),
    Some("cow"),
    Some("elephant"),
    Some("bear"),
    Some("zebra"),
    Some("giraffe"),
    None,
    Some("backpack"),
    Some("umbrella"),
    None,
    None,
    Some("handbag"),
    Some("tie"),
    Some("suitcase"),
    Some("frisbee"),
    Some("skis"),
    Some("snowboard"),
    Some("sports ball"),
    Some("kite"),
    Some("baseball bat"),
    Some("baseball glove"),
    Some("skateboard"),
    Some("surfboard"),
    Some("tennis racket"),
    Some("bottle"),
    None,
    Some("wine glass"),
    Some("cup"),
    Some("fork"),
    Some("knife"),
    Some("spoon"),
    Some("bowl"),
    Some("banana"),
    Some("apple"),
    Some("sandwich"),
    Some("orange"),
    Some("broccoli"),
    Some("carrot"),
    Some("hot dog"),
    Some("pizza"),
    Some("donut"),
    Some("cake"),
    Some("chair"),
    Some("couch"),
    Some("potted plant"),
    Some("bed"),
    None,
    Some("dining table"),
    None,
    None,
    Some("toilet"),
    None,
    Some("tv"),
    Some("laptop"),
    Some("mouse"),
    Some("remote"),
    Some("keyboard"),
    Some("cell phone"),
    Some("microwave"),
    Some("oven"),
    Some("toaster"),
    Some("sink"),
    Some("refrigerator"),
    None,
    Some("book"),
    Some("clock"),
    Some("vase"),
    Some("scissors"),
    Some("teddy bear"),
    Some("hair drier"),
    Some("toothbrush"),
];

/// Map a COCO label onto the vehicle taxonomy.
///
/// Note that no COCO label maps to `Van`; only the simulated source ever
/// produces that category.
fn vehicle_category_for(label: &str) -> Option<VehicleCategory> {
    match label {
        "bicycle" => Some(VehicleCategory::Bicycle),
        "car" => Some(VehicleCategory::Car),
        "motorcycle" => Some(VehicleCategory::Motorcycle),
        "bus" => Some(VehicleCategory::Bus),
        "truck" => Some(VehicleCategory::Truck),
        _ => None,
    }
}

fn label_for_class(class: f32) -> Option<&'static str> {
    if !class.is_finite() || class < 0.0 {
        return None;
    }
    COCO_LABELS.get(class as usize).copied().flatten()
}

/// Interpret raw model output into detections, in index order.
///
/// Malformed shapes fail with `DetectError::Decode` and yield no partial
/// results; callers may treat the cycle as empty but the error itself is
/// surfaced for logging.
pub fn decode(raw: &RawOutputs) -> Result<Vec<Detection>, DetectError> {
    let n = raw.scores.len();
    if raw.classes.len() != n {
        return Err(DetectError::Decode(format!(
            "classes length {} does not match scores length {}",
            raw.classes.len(),
            n
        )));
    }
    if raw.boxes.len() != n * 4 {
        return Err(DetectError::Decode(format!(
            "boxes length {} is not 4x scores length {}",
            raw.boxes.len(),
            n
        )));
    }
    if raw.valid_count > n {
        return Err(DetectError::Decode(format!(
            "valid count {} exceeds row count {}",
            raw.valid_count, n
        )));
    }

    let mut detections = Vec::new();
    for i in 0..raw.valid_count {
        let score = raw.scores[i];
        if !(score > CONFIDENCE_THRESHOLD) {
            continue;
        }

        let Some(label) = label_for_class(raw.classes[i]) else {
            continue;
        };
        let Some(category) = vehicle_category_for(label) else {
            continue;
        };

        // Rows are normalized [y1, x1, y2, x2] corners.
        let y1 = raw.boxes[i * 4];
        let x1 = raw.boxes[i * 4 + 1];
        let y2 = raw.boxes[i * 4 + 2];
        let x2 = raw.boxes[i * 4 + 3];

        let bbox = BoundingBox {
            x: x1 * INPUT_WIDTH as f32,
            y: y1 * INPUT_HEIGHT as f32,
            width: (x2 - x1) * INPUT_WIDTH as f32,
            height: (y2 - y1) * INPUT_HEIGHT as f32,
        };
        // Degenerate boxes (inverted or empty corners) carry no detection.
        if !(bbox.width > 0.0 && bbox.height > 0.0) {
            continue;
        }

        detections.push(Detection::new(category, score, bbox));
    }
    Ok(detections)
}
