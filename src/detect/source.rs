use image::RgbImage;

use crate::detect::Detection;
use crate::error::DetectError;

/// One of the two detection producers: model-backed or simulated.
///
/// Both variants share this signature so the aggregation side never knows
/// which one it is fed by. Selection happens once, when the monitor is
/// constructed.
pub trait DetectionSource: Send {
    /// Source identifier, for logs.
    fn name(&self) -> &'static str;

    /// True when detections come from a real model rather than simulation.
    fn is_real(&self) -> bool;

    /// Produce the detections for one frame.
    ///
    /// The simulated variant ignores the image. A failed call yields no
    /// partial results.
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>, DetectError>;
}
