//! Image preprocessing for the detection model.
//!
//! The detector consumes a fixed 320x320 analysis frame: bilinear resize,
//! channels normalized to [0, 1], NHWC layout with a leading batch dimension
//! of 1. Pure and deterministic for identical input; staging buffers are
//! scoped to the call.

use image::imageops::{self, FilterType};
use image::RgbImage;

/// Spatial input size expected by the detector.
pub const INPUT_WIDTH: u32 = 320;
pub const INPUT_HEIGHT: u32 = 320;

/// Normalized, batched model input.
///
/// `data` holds `1 * height * width * 3` f32 values in NHWC order.
#[derive(Clone, Debug)]
pub struct InputTensor {
    pub data: Vec<f32>,
    pub width: u32,
    pub height: u32,
}

impl InputTensor {
    /// Tensor shape including the batch dimension.
    pub fn shape(&self) -> [usize; 4] {
        [1, self.height as usize, self.width as usize, 3]
    }
}

/// Convert an arbitrary decoded image into the detector's input tensor.
pub fn preprocess(image: &RgbImage) -> InputTensor {
    let resized = imageops::resize(image, INPUT_WIDTH, INPUT_HEIGHT, FilterType::Triangle);

    let mut data = Vec::with_capacity((INPUT_WIDTH * INPUT_HEIGHT * 3) as usize);
    for pixel in resized.pixels() {
        for channel in 0..3 {
            data.push(pixel[channel] as f32 / 255.0);
        }
    }

    InputTensor {
        data,
        width: INPUT_WIDTH,
        height: INPUT_HEIGHT,
    }
}
