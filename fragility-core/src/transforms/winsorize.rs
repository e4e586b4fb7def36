//! Winsorize: clip a series' tails to its own quantile bounds.

use super::TransformError;
use crate::stats;

/// Clip every defined value into `[q(lower_q), q(upper_q)]` of the defined values.
///
/// NaN passes through unchanged. Requires `0 <= lower_q < upper_q <= 1`.
pub fn winsorize(values: &[f64], lower_q: f64, upper_q: f64) -> Result<Vec<f64>, TransformError> {
    validate_quantiles(lower_q, upper_q)?;

    let mut sorted = stats::defined(values);
    if sorted.is_empty() {
        return Ok(values.to_vec());
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let low = stats::quantile_sorted(&sorted, lower_q);
    let high = stats::quantile_sorted(&sorted, upper_q);

    Ok(values
        .iter()
        .map(|&v| if v.is_nan() { v } else { v.max(low).min(high) })
        .collect())
}

pub(crate) fn validate_quantiles(lower_q: f64, upper_q: f64) -> Result<(), TransformError> {
    let ordered = (0.0..=1.0).contains(&lower_q) && (0.0..=1.0).contains(&upper_q) && lower_q < upper_q;
    if ordered {
        Ok(())
    } else {
        Err(TransformError::InvalidQuantiles { lower_q, upper_q })
    }
}
