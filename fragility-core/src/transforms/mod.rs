//! Transform Library: univariate series operators.
//!
//! - `winsorize`: clip tails to the series' own quantiles
//! - `rolling_robust_zscore`: median/MAD standardization over a trailing window
//! - `logistic_scale`: map z-scores onto 0–100 with 50 as neutral
//! - `normalize_score`: the composition of all three
//!
//! All operators are pure: slice in, new `Vec<f64>` out, same length.

pub mod logistic;
pub mod normalize;
pub mod robust_zscore;
pub mod winsorize;

pub use logistic::{logistic, logistic_scale};
pub use normalize::normalize_score;
pub use robust_zscore::rolling_robust_zscore;
pub use winsorize::winsorize;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("invalid winsorize quantiles ({lower_q}, {upper_q}): need 0 <= lower < upper <= 1")]
    InvalidQuantiles { lower_q: f64, upper_q: f64 },

    #[error("rolling window must be at least one period")]
    ZeroWindow,
}

/// Normalization settings shared by every component score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizeParams {
    /// Rolling robust z-score lookback, in periods.
    pub window: usize,
    pub lower_q: f64,
    pub upper_q: f64,
}

impl NormalizeParams {
    /// Validated constructor.
    pub fn new(window: usize, lower_q: f64, upper_q: f64) -> Result<Self, TransformError> {
        if window == 0 {
            return Err(TransformError::ZeroWindow);
        }
        winsorize::validate_quantiles(lower_q, upper_q)?;
        Ok(Self {
            window,
            lower_q,
            upper_q,
        })
    }
}

impl Default for NormalizeParams {
    /// Two years of weekly periods, 5%/95% winsorization.
    fn default() -> Self {
        Self {
            window: 104,
            lower_q: 0.05,
            upper_q: 0.95,
        }
    }
}
