//! Degraded-mode generation: synthetic tumor-like masks produced when no model
//! is loaded or every inference tier has failed. Output satisfies the same
//! contract as the real pipeline.

use ndarray::Array2;
use rand::Rng;

use crate::classify::{INVASIVE_CONFIDENCE, MOCK_LABEL};
use crate::mask::gaussian_smooth;
use crate::pipeline::InferenceResult;
use crate::regions::RegionScores;

pub const MIN_BLOBS: u32 = 3;
pub const MAX_BLOBS: u32 = 5;
pub const MIN_RADIUS: u32 = 30;
pub const MAX_RADIUS: u32 = 80;
pub const MIN_INTENSITY: f32 = 0.7;
pub const REBINARIZE_THRESHOLD: f32 = 0.3;

/// σ matching the original 21x21 OpenCV smoothing kernel.
const SMOOTH_SIGMA: f32 = 3.5;

/// Draw 3-5 elliptical blobs at random centers and radii, smooth, and
/// re-binarize. The random source is injected so tests can seed it.
pub fn synthetic_mask<R: Rng>(height: u32, width: u32, rng: &mut R) -> Array2<f32> {
    let (h, w) = (height as usize, width as usize);
    let mut mask = Array2::<f32>::zeros((h, w));
    if width < 2 || height < 2 {
        return mask;
    }

    let blob_count = rng.gen_range(MIN_BLOBS..=MAX_BLOBS);
    for _ in 0..blob_count {
        let cx = rng.gen_range(width / 4..3 * width / 4) as f32;
        let cy = rng.gen_range(height / 4..3 * height / 4) as f32;
        let rx = rng.gen_range(MIN_RADIUS..MAX_RADIUS) as f32;
        let ry = rng.gen_range(MIN_RADIUS..MAX_RADIUS) as f32;
        let intensity = rng.gen_range(MIN_INTENSITY..1.0);

        let y_lo = (cy - ry).max(0.0) as usize;
        let y_hi = ((cy + ry) as usize + 1).min(h);
        let x_lo = (cx - rx).max(0.0) as usize;
        let x_hi = ((cx + rx) as usize + 1).min(w);
        for y in y_lo..y_hi {
            for x in x_lo..x_hi {
                let dx = (x as f32 - cx) / rx;
                let dy = (y as f32 - cy) / ry;
                if dx * dx + dy * dy <= 1.0 {
                    mask[[y, x]] = intensity;
                }
            }
        }
    }

    let smoothed = gaussian_smooth(&mask, SMOOTH_SIGMA);
    smoothed.mapv(|v| if v > REBINARIZE_THRESHOLD { 1.0 } else { 0.0 })
}

/// Complete degraded-mode result: fixed mock diagnosis, heatmap equal to the
/// mask, region scores from the synthetic mask.
pub fn synthetic_result<R: Rng>(height: u32, width: u32, rng: &mut R) -> InferenceResult {
    let mask = synthetic_mask(height, width, rng);
    let region_scores = RegionScores::from_mask(&mask);
    InferenceResult {
        diagnosis: MOCK_LABEL.to_string(),
        confidence: INVASIVE_CONFIDENCE,
        heatmap: mask.clone(),
        mask,
        region_scores,
    }
}
