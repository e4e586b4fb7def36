//! Feature Builders: raw tables in, per-domain feature tables out.
//!
//! - `market`: sector returns, momentum, volatility, relative strength
//! - `divergence`: cross-sectional dispersion and crowding
//! - `narrative`: filing-derived text metrics on the weekly calendar
//! - `macro_features`: credit spread (or drawdown proxy) and volatility index
//!
//! [`build_weekly_features`] runs all four and aligns them onto the canonical
//! Friday calendar taken from the market features.

pub mod divergence;
pub mod macro_features;
pub mod market;
pub mod narrative;

pub use divergence::compute_divergence_features;
pub use macro_features::compute_macro_features;
pub use market::compute_market_features;
pub use narrative::{align_narrative, compute_narrative_features};

use crate::domain::{FilingSignal, Frame, Series};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Feature column names.
pub mod columns {
    pub const AI_RELATIVE_STRENGTH: &str = "ai_relative_strength";
    pub const AI_PRICE_ACCELERATION: &str = "ai_price_acceleration";
    pub const AI_VOLATILITY: &str = "ai_volatility";
    pub const AI_VOL_OF_VOL: &str = "ai_vol_of_vol";
    pub const AI_RETURNS: &str = "ai_returns";
    pub const BENCH_RETURNS: &str = "bench_returns";
    pub const AI_DISPERSION: &str = "ai_dispersion";
    pub const AI_CROWDING_CORR: &str = "ai_crowding_corr";
    pub const AI_DENSITY: &str = "ai_density";
    pub const PRICING_PRESSURE: &str = "pricing_pressure";
    pub const RISK_LANGUAGE: &str = "risk_language";
    pub const EFFICIENCY_TRANSFORM_TREND: &str = "efficiency_transform_trend";
    pub const HY_SPREAD: &str = "hy_spread";
    pub const VIX: &str = "vix";
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("none of the sector tickers {requested:?} are in the price table")]
    NoSectorTickers { requested: Vec<String> },
}

/// Every feature table on one weekly calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyFeatures {
    pub calendar: Vec<NaiveDate>,
    pub market: Frame,
    pub divergence: Frame,
    pub narrative: Frame,
    pub macro_features: Frame,
    /// Daily sector returns before resampling. Stress events are detected on these.
    pub daily_sector_returns: Series,
}

impl WeeklyFeatures {
    /// Look a feature column up across all domains, in market, divergence,
    /// narrative, macro order.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        [
            &self.market,
            &self.divergence,
            &self.narrative,
            &self.macro_features,
        ]
        .into_iter()
        .find_map(|frame| frame.values(name))
    }
}

/// Build every feature table and align it onto the market weekly calendar.
///
/// Market, divergence and macro features are resampled to the last value of
/// each week; narrative features are aligned with their capped forward-fill.
pub fn build_weekly_features(
    prices: &Frame,
    macro_table: &Frame,
    filings: &[FilingSignal],
    sector: &[String],
    benchmark: &str,
) -> Result<WeeklyFeatures, FeatureError> {
    let daily = compute_market_features(prices, sector, benchmark)?;
    let daily_sector_returns = daily
        .column(columns::AI_RETURNS)
        .unwrap_or_else(|| Series::undefined(&daily.index));
    let market = daily.resample_weekly_last();
    let calendar = market.index.clone();

    let divergence = compute_divergence_features(prices, sector)
        .resample_weekly_last()
        .reindex(&calendar);
    let macro_features = compute_macro_features(macro_table, prices, benchmark)
        .resample_weekly_last()
        .reindex(&calendar);
    let narrative = align_narrative(&compute_narrative_features(filings), &calendar);

    tracing::debug!(
        weeks = calendar.len(),
        narrative_columns = narrative.columns.len(),
        "weekly features aligned"
    );

    Ok(WeeklyFeatures {
        calendar,
        market,
        divergence,
        narrative,
        macro_features,
        daily_sector_returns,
    })
}

/// Requested tickers that are columns of `prices`, in request order, without duplicates.
pub(crate) fn present_tickers<'a>(prices: &Frame, requested: &'a [String]) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for ticker in requested {
        if prices.has_column(ticker) && !out.contains(&ticker.as_str()) {
            out.push(ticker.as_str());
        }
    }
    out
}

/// One-period simple returns of the named columns.
pub(crate) fn simple_returns(prices: &Frame, tickers: &[&str]) -> Frame {
    let mut returns = Frame::new(prices.index.clone());
    for ticker in tickers {
        if let Some(values) = prices.values(ticker) {
            returns.insert(*ticker, crate::stats::pct_change(values, 1));
        }
    }
    returns
}

/// Per-row mean of the defined values in the named columns.
pub(crate) fn row_means(frame: &Frame, names: &[&str]) -> Vec<f64> {
    (0..frame.nrows())
        .map(|i| crate::stats::mean(&frame.row(i, names)))
        .collect()
}


#[cfg(test)]
mod tests {
    use super::test_support::price_frame;
    use super::*;

    fn sector(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn present_tickers_keeps_order_and_dedups() {
        let prices = price_frame(&[("A", vec![1.0]), ("B", vec![1.0])]);
        let requested = sector(&["B", "X", "A", "B"]);
        assert_eq!(present_tickers(&prices, &requested), vec!["B", "A"]);
    }

    #[test]
    fn weekly_features_share_calendar() {
        let n = 120;
        let path: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 * 0.2).sin() * 3.0).collect();
        let bench: Vec<f64> = (0..n).map(|i| 100.0 + i as f64 * 0.1).collect();
        let prices = price_frame(&[("NVDA", path.clone()), ("AMD", path), ("SPY", bench)]);

        let features =
            build_weekly_features(&prices, &Frame::default(), &[], &sector(&["NVDA", "AMD"]), "SPY")
                .unwrap();

        assert_eq!(features.market.index, features.calendar);
        assert_eq!(features.divergence.index, features.calendar);
        assert_eq!(features.macro_features.index, features.calendar);
        assert_eq!(features.narrative.index, features.calendar);
        // 2024-01-01 is a Monday; the first bin ends Friday 2024-01-05
        assert_eq!(
            features.calendar[0],
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert!(features.column(columns::HY_SPREAD).is_some());
        assert!(features.column(columns::AI_DENSITY).is_none());
        assert_eq!(features.daily_sector_returns.index, prices.index);
        assert!(features.daily_sector_returns.values[0].is_nan());
        assert!(!features.daily_sector_returns.values[1].is_nan());
    }

    #[test]
    fn missing_sector_is_fatal() {
        let prices = price_frame(&[("SPY", vec![1.0, 2.0])]);
        let err = build_weekly_features(&prices, &Frame::default(), &[], &sector(&["NVDA"]), "SPY")
            .unwrap_err();
        assert!(matches!(err, FeatureError::NoSectorTickers { .. }));
    }
}
