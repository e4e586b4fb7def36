//! Narrative features from text-derived filing metrics.
//!
//! Filings arrive quarterly at best, so each filing's signal is carried
//! forward on the weekly calendar for at most 13 weeks (about one quarter)
//! and then fades to zero. Narrative columns are never undefined: anything
//! that is NaN or infinite after the derivation becomes 0.

use super::columns;
use crate::domain::series::ffill_values;
use crate::domain::{FilingSignal, Frame, STANDARDIZED_METRICS};
use crate::stats;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Maximum number of weekly periods a filing's values are carried forward.
pub const NARRATIVE_FILL_LIMIT: usize = 13;

/// Smoothing window for the efficiency/transform ratio.
pub const RATIO_SMOOTHING: usize = 4;

/// Percent-change horizon for the efficiency/transform trend.
pub const TREND_HORIZON: usize = 13;

const RATIO: &str = "efficiency_transform_ratio";

/// Build the weekly narrative feature table. Empty when there are no filings.
pub fn compute_narrative_features(filings: &[FilingSignal]) -> Frame {
    if filings.is_empty() {
        return Frame::default();
    }

    let standardized = standardize_per_ticker(filings);

    // Cross-ticker mean per filing date.
    let mut cells: BTreeMap<(NaiveDate, &str), Vec<f64>> = BTreeMap::new();
    for (filing, z) in filings.iter().zip(&standardized) {
        for (metric, value) in STANDARDIZED_METRICS.iter().zip(z) {
            cells.entry((filing.date, *metric)).or_default().push(*value);
        }
        cells
            .entry((filing.date, RATIO))
            .or_default()
            .push(filing.efficiency_transform_ratio);
    }
    let by_date = Frame::from_observations(
        cells
            .into_iter()
            .map(|((date, metric), values)| (date, metric, stats::mean(&values))),
    );

    let weekly = by_date.resample_weekly_ffill(NARRATIVE_FILL_LIMIT);

    let ratio = weekly
        .values(RATIO)
        .map(<[f64]>::to_vec)
        .unwrap_or_else(|| vec![f64::NAN; weekly.nrows()]);
    let smoothed = stats::rolling_mean(&ratio, RATIO_SMOOTHING, 1);
    let trend = stats::pct_change(&ffill_values(&smoothed, None), TREND_HORIZON);

    let mut features = Frame::new(weekly.index.clone());
    for metric in STANDARDIZED_METRICS {
        if let Some(values) = weekly.values(metric) {
            features.insert(metric, values.to_vec());
        }
    }
    features.insert(columns::EFFICIENCY_TRANSFORM_TREND, trend);
    features.fill_undefined(0.0)
}

/// Re-index narrative features onto the engine calendar.
///
/// Values carry forward for at most [`NARRATIVE_FILL_LIMIT`] periods past the
/// last narrative row; every remaining gap is 0.
pub fn align_narrative(features: &Frame, calendar: &[NaiveDate]) -> Frame {
    if features.columns.is_empty() {
        return Frame::new(calendar.to_vec());
    }
    features
        .reindex(calendar)
        .ffill(Some(NARRATIVE_FILL_LIMIT))
        .fill_undefined(0.0)
}

/// Per-ticker population z-scores of the standardized metrics, one row per filing.
///
/// A zero standard deviation is replaced by 1.0 so single-filing tickers
/// standardize to 0 instead of blowing up.
fn standardize_per_ticker(filings: &[FilingSignal]) -> Vec<[f64; 3]> {
    let mut by_ticker: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, f) in filings.iter().enumerate() {
        by_ticker.entry(f.ticker.as_str()).or_default().push(i);
    }

    let mut out = vec![[f64::NAN; 3]; filings.len()];
    for rows in by_ticker.values() {
        for (m, metric) in STANDARDIZED_METRICS.iter().enumerate() {
            let values: Vec<f64> = rows
                .iter()
                .map(|&i| filings[i].metric(metric).unwrap_or(f64::NAN))
                .collect();
            let mean = stats::mean(&values);
            let mut sd = stats::std_dev(&values, 0);
            if sd == 0.0 {
                sd = 1.0;
            }
            for (&row, value) in rows.iter().zip(&values) {
                out[row][m] = (value - mean) / sd;
            }
        }
    }
    out
}
