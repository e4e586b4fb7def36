//! Macro features: credit-spread stress and volatility index.
//!
//! When the macro table has no credit-spread series the engine synthesizes a
//! proxy from the benchmark's drawdown off its trailing high, so a missing
//! external feed degrades the signal instead of failing the run.

use super::{columns, row_means};
use crate::domain::{Frame, Series};
use crate::stats;

/// Trailing-high lookback for the drawdown proxy.
pub const DRAWDOWN_WINDOW: usize = 63;

/// Minimum observations before the trailing high is defined.
pub const DRAWDOWN_MIN_PERIODS: usize = 10;

/// Build macro features on the price calendar.
pub fn compute_macro_features(macro_table: &Frame, prices: &Frame, benchmark: &str) -> Frame {
    let mut features = Frame::new(prices.index.clone());

    let spread = match macro_table.column(columns::HY_SPREAD) {
        Some(series) => series,
        None => {
            tracing::warn!(benchmark, "no credit-spread series; using benchmark drawdown proxy");
            drawdown_proxy(prices, benchmark)
        }
    };
    features.insert(
        columns::HY_SPREAD,
        spread.reindex(&prices.index).ffill(None).values,
    );

    if let Some(vix) = macro_table.column(columns::VIX) {
        features.insert(columns::VIX, vix.reindex(&prices.index).ffill(None).values);
    }
    features
}

/// Drawdown of the benchmark from its trailing high, on the benchmark's own
/// defined dates. Uses the mean price of every ticker when the benchmark is absent.
fn drawdown_proxy(prices: &Frame, benchmark: &str) -> Series {
    let level = match prices.column(benchmark) {
        Some(series) => series,
        None => {
            tracing::warn!(benchmark, "benchmark missing; drawdown proxy uses mean price");
            let all: Vec<&str> = prices.column_names();
            Series::new(prices.index.clone(), row_means(prices, &all))
        }
    };

    let (dates, values): (Vec<_>, Vec<_>) = level
        .index
        .iter()
        .zip(&level.values)
        .filter(|(_, v)| !v.is_nan())
        .map(|(d, v)| (*d, *v))
        .unzip();

    let high = stats::rolling_max(&values, DRAWDOWN_WINDOW, DRAWDOWN_MIN_PERIODS);
    let drawdown = values.iter().zip(&high).map(|(v, h)| v / h - 1.0).collect();
    Series::new(dates, drawdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::{daily_dates, price_frame};
    use crate::stats::test_support::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn external_spread_is_forward_filled() {
        let prices = price_frame(&[("SPY", vec![100.0; 5])]);
        let dates = daily_dates(5);
        let mut macro_table = Frame::new(vec![dates[0], dates[2]]);
        macro_table.insert(columns::HY_SPREAD, vec![3.5, 4.0]);

        let features = compute_macro_features(&macro_table, &prices, "SPY");
        let hy = features.values(columns::HY_SPREAD).unwrap();
        assert_eq!(hy, &[3.5, 3.5, 4.0, 4.0, 4.0]);
        assert!(!features.has_column(columns::VIX));
    }

    #[test]
    fn missing_spread_uses_drawdown_proxy() {
        let mut closes = vec![100.0; 12];
        closes[11] = 90.0;
        let prices = price_frame(&[("SPY", closes)]);
        let features = compute_macro_features(&Frame::default(), &prices, "SPY");
        let hy = features.values(columns::HY_SPREAD).unwrap();
        // Trailing high needs 10 observations
        assert!(hy[8].is_nan());
        assert_approx(hy[9], 0.0, DEFAULT_EPSILON);
        assert_approx(hy[11], -0.1, DEFAULT_EPSILON);
    }

    #[test]
    fn vix_is_carried_when_present() {
        let prices = price_frame(&[("SPY", vec![100.0; 3])]);
        let dates = daily_dates(3);
        let mut macro_table = Frame::new(vec![dates[0]]);
        macro_table.insert(columns::VIX, vec![18.0]);
        let features = compute_macro_features(&macro_table, &prices, "SPY");
        assert_eq!(features.values(columns::VIX).unwrap(), &[18.0, 18.0, 18.0]);
        // No spread series → proxy, undefined during warm-up
        assert!(features.values(columns::HY_SPREAD).unwrap()[0].is_nan());
    }

    #[test]
    fn proxy_without_benchmark_uses_mean_price() {
        let mut closes = vec![50.0; 12];
        closes[11] = 40.0;
        let prices = price_frame(&[("NVDA", closes)]);
        let features = compute_macro_features(&Frame::default(), &prices, "SPY");
        assert_approx(features.values(columns::HY_SPREAD).unwrap()[11], -0.2, DEFAULT_EPSILON);
    }
}
