//! Market features from the price table.
//!
//! Sector return/volatility/momentum statistics plus relative strength
//! against a benchmark. Rolling statistics need a full window of defined
//! values and are computed on the return calendar (rows where at least one
//! ticker has a return), then re-indexed onto the price calendar.

use super::{columns, present_tickers, row_means, simple_returns, FeatureError};
use crate::domain::series::ffill_values;
use crate::domain::{Frame, Series};
use crate::stats;

/// Lookback for momentum, acceleration, realized volatility and relative strength.
pub const MARKET_WINDOW: usize = 21;

/// Trading periods per year used to annualize realized volatility.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Build the market feature table.
///
/// Falls back to the cross-sectional mean return of every ticker when the
/// benchmark is missing. Fails only when no sector ticker is in `prices`.
pub fn compute_market_features(
    prices: &Frame,
    sector: &[String],
    benchmark: &str,
) -> Result<Frame, FeatureError> {
    let available = present_tickers(prices, sector);
    if available.is_empty() {
        return Err(FeatureError::NoSectorTickers {
            requested: sector.to_vec(),
        });
    }

    let all_tickers: Vec<&str> = prices.column_names();
    let returns = simple_returns(prices, &all_tickers).drop_all_undefined_rows();

    let ai_returns = row_means(&returns, &available);
    let bench_returns = match returns.values(benchmark) {
        Some(values) => values.to_vec(),
        None => {
            tracing::warn!(
                benchmark,
                "benchmark missing from price table; using cross-sectional mean return"
            );
            row_means(&returns, &all_tickers)
        }
    };

    let ai_price = ffill_values(&row_means(prices, &available), None);
    let momentum = stats::pct_change(&ai_price, MARKET_WINDOW);
    let acceleration = stats::diff(&momentum, MARKET_WINDOW);

    let volatility: Vec<f64> = stats::rolling_std(&ai_returns, MARKET_WINDOW)
        .into_iter()
        .map(|v| v * PERIODS_PER_YEAR.sqrt())
        .collect();
    let vol_of_vol = stats::rolling_std(&volatility, MARKET_WINDOW);

    let excess: Vec<f64> = ai_returns
        .iter()
        .zip(&bench_returns)
        .map(|(a, b)| a - b)
        .collect();
    let relative_strength = stats::rolling_sum(&excess, MARKET_WINDOW);

    let mut features = Frame::new(prices.index.clone());
    let on_returns = |values: Vec<f64>| Series::new(returns.index.clone(), values);
    features.insert_series(columns::AI_RELATIVE_STRENGTH, &on_returns(relative_strength));
    features.insert(columns::AI_PRICE_ACCELERATION, acceleration);
    features.insert_series(columns::AI_VOLATILITY, &on_returns(volatility));
    features.insert_series(columns::AI_VOL_OF_VOL, &on_returns(vol_of_vol));
    features.insert_series(columns::AI_RETURNS, &on_returns(ai_returns));
    features.insert_series(columns::BENCH_RETURNS, &on_returns(bench_returns));
    Ok(features)
}
