//! Probability maps and binary masks: sigmoid, bilinear upsampling, adaptive
//! thresholding and Gaussian smoothing.

use image::{ImageBuffer, Luma};
use imageproc::filter::gaussian_blur_f32;
use ndarray::Array2;

/// Quantile used for the adaptive per-image threshold (top 25% as lesion).
pub const ADAPTIVE_QUANTILE: f64 = 0.75;

/// Threshold applied when the quantile cannot be computed.
pub const FALLBACK_THRESHOLD: f32 = 0.5;

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Elementwise sigmoid over a logit map.
pub fn sigmoid_map(logits: &Array2<f32>) -> Array2<f32> {
    logits.mapv(sigmoid)
}

/// Bilinear upsampling with half-pixel centers (align_corners = false).
pub fn upsample_bilinear(src: &Array2<f32>, out_h: usize, out_w: usize) -> Array2<f32> {
    let (src_h, src_w) = src.dim();
    if src_h == 0 || src_w == 0 || out_h == 0 || out_w == 0 {
        return Array2::zeros((out_h, out_w));
    }

    let scale_y = src_h as f32 / out_h as f32;
    let scale_x = src_w as f32 / out_w as f32;
    let mut out = Array2::<f32>::zeros((out_h, out_w));

    for oy in 0..out_h {
        let sy = ((oy as f32 + 0.5) * scale_y - 0.5).clamp(0.0, (src_h - 1) as f32);
        let y0 = sy.floor() as usize;
        let y1 = (y0 + 1).min(src_h - 1);
        let fy = sy - y0 as f32;
        for ox in 0..out_w {
            let sx = ((ox as f32 + 0.5) * scale_x - 0.5).clamp(0.0, (src_w - 1) as f32);
            let x0 = sx.floor() as usize;
            let x1 = (x0 + 1).min(src_w - 1);
            let fx = sx - x0 as f32;

            let top = src[[y0, x0]] * (1.0 - fx) + src[[y0, x1]] * fx;
            let bottom = src[[y1, x0]] * (1.0 - fx) + src[[y1, x1]] * fx;
            out[[oy, ox]] = top * (1.0 - fy) + bottom * fy;
        }
    }
    out
}

/// Linear-interpolated order statistic of a map.
///
/// Returns `None` when the map is empty, contains NaN, or is single-valued
/// (a degenerate distribution has no usable quantile).
pub fn percentile(map: &Array2<f32>, q: f64) -> Option<f32> {
    let mut values: Vec<f32> = map.iter().copied().collect();
    if values.is_empty() || values.iter().any(|v| v.is_nan()) {
        return None;
    }
    values.sort_unstable_by(f32::total_cmp);
    let (lo, hi) = (values[0], values[values.len() - 1]);
    if lo == hi {
        return None;
    }
    let rank = (values.len() - 1) as f64 * q;
    let idx = rank.floor() as usize;
    let frac = (rank - idx as f64) as f32;
    let next = values[(idx + 1).min(values.len() - 1)];
    Some(values[idx] + (next - values[idx]) * frac)
}

/// Binarize a probability map at its adaptive threshold.
///
/// τ is the 75th percentile of the map; when that cannot be computed the
/// threshold falls back to [`FALLBACK_THRESHOLD`]. Output values are {0.0, 1.0}.
pub fn threshold_mask(prob: &Array2<f32>) -> Array2<f32> {
    let tau = percentile(prob, ADAPTIVE_QUANTILE).unwrap_or(FALLBACK_THRESHOLD);
    prob.mapv(|p| if p >= tau { 1.0 } else { 0.0 })
}

/// Gaussian smoothing of a 2D map via `imageproc`.
pub fn gaussian_smooth(map: &Array2<f32>, sigma: f32) -> Array2<f32> {
    let (h, w) = map.dim();
    if h == 0 || w == 0 || sigma <= 0.0 {
        return map.clone();
    }
    let pixels: Vec<f32> = map.iter().copied().collect();
    let buffer = match ImageBuffer::<Luma<f32>, Vec<f32>>::from_raw(w as u32, h as u32, pixels) {
        Some(buffer) => buffer,
        None => return map.clone(),
    };
    let blurred = gaussian_blur_f32(&buffer, sigma);
    Array2::from_shape_vec((h, w), blurred.into_raw())
        .expect("blurred buffer length matches map dimensions")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_midpoint_and_saturation() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(10.0) > 0.999);
        assert!(sigmoid(-10.0) < 0.001);
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let map = Array2::from_shape_vec((1, 4), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let p = percentile(&map, 0.75).unwrap();
        assert!((p - 2.25).abs() < 1e-6);
    }

    #[test]
    fn percentile_rejects_degenerate_maps() {
        assert_eq!(percentile(&Array2::zeros((0, 0)), 0.75), None);
        assert_eq!(percentile(&Array2::from_elem((8, 8), 0.4), 0.75), None);
        let with_nan = Array2::from_shape_vec((1, 2), vec![0.1, f32::NAN]).unwrap();
        assert_eq!(percentile(&with_nan, 0.75), None);
    }

    #[test]
    fn uniform_zero_map_yields_all_zero_mask() {
        let prob = Array2::<f32>::zeros((16, 16));
        let mask = threshold_mask(&prob);
        assert!(mask.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn threshold_keeps_top_quartile() {
        // 25% of pixels high, 75% low: the adaptive cut lands between them.
        let mut prob = Array2::<f32>::from_elem((10, 10), 0.1);
        for y in 0..5 {
            for x in 0..5 {
                prob[[y, x]] = 0.9;
            }
        }
        let mask = threshold_mask(&prob);
        let ones = mask.iter().filter(|&&v| v == 1.0).count();
        assert_eq!(ones, 25);
        assert_eq!(mask[[0, 0]], 1.0);
        assert_eq!(mask[[9, 9]], 0.0);
    }

    #[test]
    fn upsample_preserves_constant_maps() {
        let src = Array2::from_elem((4, 4), 0.7);
        let up = upsample_bilinear(&src, 100, 100);
        assert_eq!(up.dim(), (100, 100));
        assert!(up.iter().all(|v| (v - 0.7).abs() < 1e-6));
    }

    #[test]
    fn upsample_same_size_is_identity() {
        let src = Array2::from_shape_fn((8, 8), |(y, x)| (y * 8 + x) as f32);
        let up = upsample_bilinear(&src, 8, 8);
        for (a, b) in src.iter().zip(up.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn smoothing_spreads_mass_but_keeps_shape() {
        let mut map = Array2::<f32>::zeros((32, 32));
        map[[16, 16]] = 1.0;
        let smoothed = gaussian_smooth(&map, 3.5);
        assert_eq!(smoothed.dim(), (32, 32));
        assert!(smoothed[[16, 16]] < 1.0);
        assert!(smoothed[[16, 18]] > 0.0);
    }
}
