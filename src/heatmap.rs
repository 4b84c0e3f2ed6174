//! Cosmetic heatmap rendering: Gaussian smoothing followed by a JET colormap.

use image::{Rgb, RgbImage};
use ndarray::Array2;

use crate::mask::gaussian_smooth;

/// σ matching the original 35x35 OpenCV smoothing kernel.
const BLUR_SIGMA: f32 = 6.0;

/// JET colormap over `v` in `[0, 1]`: blue through green to red.
pub fn jet_color(v: f32) -> Rgb<u8> {
    let v = v.clamp(0.0, 1.0);
    let channel = |x: f32| (x.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgb([
        channel(1.5 - (4.0 * v - 3.0).abs()),
        channel(1.5 - (4.0 * v - 2.0).abs()),
        channel(1.5 - (4.0 * v - 1.0).abs()),
    ])
}

/// Render a grayscale attention map (values in `[0, 1]` or `[0, 255]`) as a
/// smoothed false-color RGB image.
pub fn render_heatmap(map: &Array2<f32>) -> RgbImage {
    let (h, w) = map.dim();
    let peak = map.iter().copied().fold(0.0_f32, f32::max);
    // accept both normalized and 8-bit-range inputs
    let normalized = if peak > 1.0 {
        map.mapv(|v| v / 255.0)
    } else {
        map.clone()
    };

    let smoothed = gaussian_smooth(&normalized, BLUR_SIGMA);
    let mut image = RgbImage::new(w as u32, h as u32);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        *pixel = jet_color(smoothed[[y as usize, x as usize]]);
    }
    image
}
