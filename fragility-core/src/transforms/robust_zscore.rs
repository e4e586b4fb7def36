//! Rolling robust z-score (median / MAD).
//!
//! For heavy-tailed return-derived series a mean/stdev z-score is dragged
//! around by single outliers; the median and the median absolute deviation
//! are not.
//!
//! scale = 1.4826 * MAD, falling back to the population std of the lookback
//! when MAD is zero. A zero or undefined scale yields 0.0 rather than NaN.

use super::TransformError;
use crate::stats;

/// Consistency constant that makes MAD estimate sigma for normal data.
pub const MAD_SCALE: f64 = 1.4826;

/// Minimum defined observations required in a lookback of `window` positions.
pub fn min_periods(window: usize) -> usize {
    10usize.max(window / 4)
}

/// Rolling robust z-score over trailing lookbacks of `window` positions.
///
/// Positions with fewer than [`min_periods`] defined observations in their
/// lookback are NaN.
pub fn rolling_robust_zscore(values: &[f64], window: usize) -> Result<Vec<f64>, TransformError> {
    if window == 0 {
        return Err(TransformError::ZeroWindow);
    }
    Ok(stats::rolling_apply(values, window, min_periods(window), robust_z))
}

/// Robust z-score of the last element of `lookback` against the whole lookback.
fn robust_z(lookback: &[f64]) -> f64 {
    let median = stats::median(lookback);
    let deviations: Vec<f64> = lookback.iter().map(|v| (v - median).abs()).collect();
    let mad = stats::median(&deviations);
    let scale = if mad > 0.0 {
        MAD_SCALE * mad
    } else {
        stats::std_dev(lookback, 0)
    };
    if scale == 0.0 || scale.is_nan() {
        return 0.0;
    }
    let current = lookback[lookback.len() - 1];
    (current - median) / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::test_support::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn output_matches_input_length() {
        let input: Vec<f64> = (0..50).map(f64::from).collect();
        let z = rolling_robust_zscore(&input, 20).unwrap();
        assert_eq!(z.len(), input.len());
    }

    #[test]
    fn insufficient_history_is_nan() {
        let input: Vec<f64> = (0..50).map(f64::from).collect();
        let z = rolling_robust_zscore(&input, 20).unwrap();
        // min_periods = max(10, 5) = 10
        assert!(z[..9].iter().all(|v| v.is_nan()));
        assert!(!z[9].is_nan());
    }

    #[test]
    fn min_periods_scales_with_window() {
        assert_eq!(min_periods(20), 10);
        assert_eq!(min_periods(104), 26);
    }

    #[test]
    fn linear_ramp_hand_computed() {
        // Lookback 0..=9: median 4.5, |x - 4.5| = {0.5,1.5,...,4.5} x2, MAD = 2.5
        let input: Vec<f64> = (0..10).map(f64::from).collect();
        let z = rolling_robust_zscore(&input, 10).unwrap();
        assert_approx(z[9], (9.0 - 4.5) / (MAD_SCALE * 2.5), DEFAULT_EPSILON);
    }

    #[test]
    fn constant_lookback_is_zero_not_nan() {
        let input = vec![3.0; 12];
        let z = rolling_robust_zscore(&input, 12).unwrap();
        assert_approx(z[11], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn zero_mad_falls_back_to_std() {
        // Eight 0s and three 10s: median 0, MAD 0, population std > 0
        let mut input = vec![0.0; 8];
        input.extend([10.0, 10.0, 10.0]);
        let z = rolling_robust_zscore(&input, 11).unwrap();
        let std = stats::std_dev(&input, 0);
        assert_approx(z[10], 10.0 / std, DEFAULT_EPSILON);
    }

    #[test]
    fn outlier_does_not_dominate_scale() {
        let mut input: Vec<f64> = (0..30).map(|i| (i % 3) as f64).collect();
        input[15] = 1_000.0;
        let z = rolling_robust_zscore(&input, 30).unwrap();
        // The outlier itself scores huge; the next point stays moderate.
        assert!(z[15] > 100.0);
        assert!(z[16].abs() < 5.0);
    }

    #[test]
    fn zero_window_is_rejected() {
        assert!(rolling_robust_zscore(&[1.0], 0).is_err());
    }
}
