//! normalize_score: the only path from a raw feature to a 0–100 score.
//!
//! winsorize (defined values only) → rolling robust z-score → logistic.
//! Any ±inf left at the end becomes NaN.

use super::logistic::logistic_scale;
use super::robust_zscore::rolling_robust_zscore;
use super::winsorize::winsorize;
use super::TransformError;

/// Normalize raw values into 0–100 scores (NaN where undefined).
pub fn normalize_score(
    values: &[f64],
    window: usize,
    lower_q: f64,
    upper_q: f64,
) -> Result<Vec<f64>, TransformError> {
    let clipped = winsorize(values, lower_q, upper_q)?;
    let z = rolling_robust_zscore(&clipped, window)?;
    Ok(logistic_scale(&z)
        .into_iter()
        .map(|v| if v.is_infinite() { f64::NAN } else { v })
        .collect())
}
