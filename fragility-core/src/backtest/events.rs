//! Drawdown-based stress event labeling.

use crate::domain::Series;
use crate::stats;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Trailing-high lookback for the drawdown.
pub const DRAWDOWN_WINDOW: usize = 63;

/// Minimum observations before the trailing high is defined.
pub const DRAWDOWN_MIN_PERIODS: usize = 10;

/// Drawdown quantile at or below which a period is a stress event.
pub const EVENT_QUANTILE: f64 = 0.10;

/// One boolean per date: was this period a stress event?
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressEvents {
    pub flags: Vec<(NaiveDate, bool)>,
}

impl StressEvents {
    /// Dates flagged as events, ascending.
    pub fn event_dates(&self) -> Vec<NaiveDate> {
        self.flags
            .iter()
            .filter(|(_, flagged)| *flagged)
            .map(|(d, _)| *d)
            .collect()
    }

    pub fn count(&self) -> usize {
        self.flags.iter().filter(|(_, flagged)| *flagged).count()
    }
}

/// Label stress events from per-period returns.
///
/// Undefined returns compound as 0. The event threshold is one static
/// quantile over the whole drawdown history; periods whose drawdown is
/// undefined (trailing-high warm-up) are never events.
pub fn define_stress_events(returns: &Series) -> StressEvents {
    let mut level = 1.0;
    let cumulative: Vec<f64> = returns
        .values
        .iter()
        .map(|r| {
            level *= 1.0 + if r.is_nan() { 0.0 } else { *r };
            level
        })
        .collect();

    let high = stats::rolling_max(&cumulative, DRAWDOWN_WINDOW, DRAWDOWN_MIN_PERIODS);
    let drawdown: Vec<f64> = cumulative
        .iter()
        .zip(&high)
        .map(|(c, h)| c / h - 1.0)
        .collect();
    let threshold = stats::quantile(&drawdown, EVENT_QUANTILE);

    StressEvents {
        flags: returns
            .index
            .iter()
            .zip(&drawdown)
            .map(|(d, dd)| (*d, *dd <= threshold))
            .collect(),
    }
}
