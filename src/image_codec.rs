//! Base64 data-URL transport for images and masks.

use std::io::Cursor;

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use ndarray::Array2;

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Decode a base64 image into RGB. Accepts both bare base64 and
/// `data:*;base64,` URLs as produced by browsers.
pub fn decode_data_url(encoded: &str) -> anyhow::Result<RgbImage> {
    let payload = match encoded.split_once(',') {
        Some((_, rest)) => rest,
        None => encoded,
    };
    let bytes = STANDARD
        .decode(payload.trim())
        .context("invalid base64 image payload")?;
    let image = image::load_from_memory(&bytes).context("unsupported or corrupt image data")?;
    Ok(image.to_rgb8())
}

/// Encode an RGB image as a PNG data URL.
pub fn rgb_to_data_url(image: &RgbImage) -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .context("PNG encoding failed")?;
    Ok(format!("{DATA_URL_PREFIX}{}", STANDARD.encode(&buffer)))
}

/// Encode a `[0, 1]` float map as an 8-bit grayscale PNG data URL.
pub fn map_to_data_url(map: &Array2<f32>) -> anyhow::Result<String> {
    let (h, w) = map.dim();
    let pixels: Vec<u8> = map
        .iter()
        .map(|&v| (v * 255.0).clamp(0.0, 255.0) as u8)
        .collect();
    let gray = GrayImage::from_raw(w as u32, h as u32, pixels)
        .context("map dimensions do not match buffer length")?;
    let mut buffer = Vec::new();
    DynamicImage::ImageLuma8(gray)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .context("PNG encoding failed")?;
    Ok(format!("{DATA_URL_PREFIX}{}", STANDARD.encode(&buffer)))
}
