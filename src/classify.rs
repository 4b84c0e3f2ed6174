//! Tumor-coverage classification policy.
//!
//! The thresholds and confidence values are fixed lookup constants kept for
//! compatibility with the existing dashboard; this is a crude deterministic
//! policy, not a calibrated classifier.

use ndarray::Array2;

pub const INVASIVE_LABEL: &str = "Invasive Ductal Carcinoma";
pub const SUSPICIOUS_LABEL: &str = "Suspicious Mass Detected";
pub const NORMAL_LABEL: &str = "No Significant Abnormality";
pub const MOCK_LABEL: &str = "Invasive Ductal Carcinoma (Mock)";

pub const INVASIVE_PCT: f64 = 15.0;
pub const SUSPICIOUS_PCT: f64 = 5.0;

pub const INVASIVE_CONFIDENCE: f64 = 0.958;
pub const SUSPICIOUS_CONFIDENCE: f64 = 0.823;
pub const NORMAL_CONFIDENCE: f64 = 0.712;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub diagnosis: &'static str,
    pub confidence: f64,
}

/// Fraction of mask pixels above 0.5, as a percentage of the image area.
/// Defined as 0.0 for a zero-area mask.
pub fn tumor_percentage(mask: &Array2<f32>) -> f64 {
    let total_area = mask.len();
    if total_area == 0 {
        return 0.0;
    }
    let tumor_area = mask.iter().filter(|&&v| v > 0.5).count();
    tumor_area as f64 / total_area as f64 * 100.0
}

/// Pure step function over the coverage percentage. Comparisons are strict, so
/// the boundary values 15.0 and 5.0 fall into the lower tier.
pub fn classify(tumor_pct: f64) -> Classification {
    if tumor_pct > INVASIVE_PCT {
        Classification {
            diagnosis: INVASIVE_LABEL,
            confidence: INVASIVE_CONFIDENCE,
        }
    } else if tumor_pct > SUSPICIOUS_PCT {
        Classification {
            diagnosis: SUSPICIOUS_LABEL,
            confidence: SUSPICIOUS_CONFIDENCE,
        }
    } else {
        Classification {
            diagnosis: NORMAL_LABEL,
            confidence: NORMAL_CONFIDENCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    #[test]
    fn classification_is_a_step_function() {
        assert_eq!(classify(16.0).diagnosis, INVASIVE_LABEL);
        assert_eq!(classify(16.0).confidence, INVASIVE_CONFIDENCE);
        assert_eq!(classify(10.0).diagnosis, SUSPICIOUS_LABEL);
        assert_eq!(classify(10.0).confidence, SUSPICIOUS_CONFIDENCE);
        assert_eq!(classify(3.0).diagnosis, NORMAL_LABEL);
        assert_eq!(classify(3.0).confidence, NORMAL_CONFIDENCE);
    }

    #[test]
    fn boundaries_fall_into_the_lower_tier() {
        assert_eq!(classify(15.0).diagnosis, SUSPICIOUS_LABEL);
        assert_eq!(classify(5.0).diagnosis, NORMAL_LABEL);
    }

    #[test]
    fn central_quarter_mask_is_25_percent() {
        let mut mask = Array2::<f32>::zeros((100, 100));
        mask.slice_mut(s![25..75, 25..75]).fill(1.0);
        let pct = tumor_percentage(&mask);
        assert!((pct - 25.0).abs() < 1e-9);
        assert_eq!(classify(pct).diagnosis, INVASIVE_LABEL);
    }

    #[test]
    fn sparse_mask_is_normal() {
        // 400 of 10000 pixels set -> 4%
        let mut mask = Array2::<f32>::zeros((100, 100));
        mask.slice_mut(s![..20, ..20]).fill(1.0);
        let pct = tumor_percentage(&mask);
        assert!((pct - 4.0).abs() < 1e-9);
        assert_eq!(classify(pct).diagnosis, NORMAL_LABEL);
        assert_eq!(classify(pct).confidence, NORMAL_CONFIDENCE);
    }

    #[test]
    fn zero_area_guard() {
        assert_eq!(tumor_percentage(&Array2::zeros((0, 0))), 0.0);
    }
}
