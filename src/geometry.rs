//! Image preprocessing and box prompts for the fixed-size model input space.

use image::{imageops, imageops::FilterType, RgbImage};
use ndarray::Array3;
use serde::{Deserialize, Serialize};

/// Side length of the square tensor the segmentation model consumes.
pub const MODEL_INPUT_SIZE: u32 = 1024;

/// Axis-aligned box prompt in original image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxPrompt {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl BoxPrompt {
    /// The centered box covering the middle 50% of the image in each dimension,
    /// computed with integer floor division.
    pub fn centered(width: u32, height: u32) -> Self {
        Self {
            x0: width / 4,
            y0: height / 4,
            x1: 3 * width / 4,
            y1: 3 * height / 4,
        }
    }

    /// Rescale the box into the model's `MODEL_INPUT_SIZE` square input space,
    /// applying per-axis scale factors independently.
    pub fn scale_to_input(&self, width: u32, height: u32) -> [f32; 4] {
        if width == 0 || height == 0 {
            return [0.0; 4];
        }
        let sx = MODEL_INPUT_SIZE as f32 / width as f32;
        let sy = MODEL_INPUT_SIZE as f32 / height as f32;
        [
            self.x0 as f32 * sx,
            self.y0 as f32 * sy,
            self.x1 as f32 * sx,
            self.y1 as f32 * sy,
        ]
    }
}

/// Resize and normalize an image into a channel-first `[3, 1024, 1024]` tensor
/// with values in `[0, 1]`. Pure function of the image.
pub fn preprocess_image(image: &RgbImage) -> Array3<f32> {
    let size = MODEL_INPUT_SIZE;
    let resized = imageops::resize(image, size, size, FilterType::Triangle);
    let mut tensor = Array3::<f32>::zeros((3, size as usize, size as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[c, y as usize, x as usize]] = pixel.0[c] as f32 / 255.0;
        }
    }
    tensor
}
