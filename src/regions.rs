//! Six-region importance scores derived from a binary mask.
//!
//! This is the attribution used whenever a richer, gradient-based explainer is
//! unavailable. The six slices deliberately overlap: rows are cut into thirds
//! and, independently, columns are cut into thirds.

use ndarray::{s, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Normalized importance per fixed spatial region. Scores are non-negative and
/// sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionScores {
    pub top: f64,
    pub middle: f64,
    pub bottom: f64,
    pub left: f64,
    pub center: f64,
    pub right: f64,
}

impl RegionScores {
    pub const REGION_COUNT: usize = 6;

    /// Uniform weights, used when the mask carries no signal at all.
    pub fn uniform() -> Self {
        let w = 1.0 / Self::REGION_COUNT as f64;
        Self {
            top: w,
            middle: w,
            bottom: w,
            left: w,
            center: w,
            right: w,
        }
    }

    /// Mean mask value per slice, normalized to sum 1.0 (uniform if the mask is
    /// entirely zero). Deterministic given the same mask.
    pub fn from_mask(mask: &Array2<f32>) -> Self {
        let (h, w) = mask.dim();
        if h == 0 || w == 0 {
            return Self::uniform();
        }

        let slice_mean = |view: ArrayView2<f32>| view.mean().unwrap_or(0.0) as f64;
        let raw = Self {
            top: slice_mean(mask.slice(s![..h / 3, ..])),
            middle: slice_mean(mask.slice(s![h / 3..2 * h / 3, ..])),
            bottom: slice_mean(mask.slice(s![2 * h / 3.., ..])),
            left: slice_mean(mask.slice(s![.., ..w / 3])),
            center: slice_mean(mask.slice(s![.., w / 3..2 * w / 3])),
            right: slice_mean(mask.slice(s![.., 2 * w / 3..])),
        };

        let total = raw.sum();
        if total > 0.0 {
            Self {
                top: raw.top / total,
                middle: raw.middle / total,
                bottom: raw.bottom / total,
                left: raw.left / total,
                center: raw.center / total,
                right: raw.right / total,
            }
        } else {
            Self::uniform()
        }
    }

    pub fn sum(&self) -> f64 {
        self.top + self.middle + self.bottom + self.left + self.center + self.right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_sum_to_one() {
        let mut mask = Array2::<f32>::zeros((90, 90));
        mask.slice_mut(s![10..40, 50..80]).fill(1.0);
        let scores = RegionScores::from_mask(&mask);
        assert!((scores.sum() - 1.0).abs() < 1e-6);
        assert!(scores.top > 0.0);
        assert!(scores.right > 0.0);
    }

    #[test]
    fn empty_mask_is_uniform() {
        let scores = RegionScores::from_mask(&Array2::zeros((60, 60)));
        let w = 1.0 / 6.0;
        assert!((scores.top - w).abs() < 1e-9);
        assert!((scores.middle - w).abs() < 1e-9);
        assert!((scores.bottom - w).abs() < 1e-9);
        assert!((scores.left - w).abs() < 1e-9);
        assert!((scores.center - w).abs() < 1e-9);
        assert!((scores.right - w).abs() < 1e-9);
    }

    #[test]
    fn full_mask_weights_all_regions_equally() {
        let scores = RegionScores::from_mask(&Array2::from_elem((30, 30), 1.0));
        assert!((scores.top - 1.0 / 6.0).abs() < 1e-9);
        assert!((scores.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn deterministic_for_equal_masks() {
        let mut mask = Array2::<f32>::zeros((45, 60));
        mask.slice_mut(s![..15, ..20]).fill(1.0);
        assert_eq!(
            RegionScores::from_mask(&mask),
            RegionScores::from_mask(&mask.clone())
        );
    }

    #[test]
    fn serializes_with_fixed_keys() {
        let json = serde_json::to_value(RegionScores::uniform()).unwrap();
        let object = json.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["bottom", "center", "left", "middle", "right", "top"]
        );
    }

    #[test]
    fn zero_area_mask_is_uniform() {
        let scores = RegionScores::from_mask(&Array2::zeros((0, 0)));
        assert!((scores.sum() - 1.0).abs() < 1e-9);
    }
}
