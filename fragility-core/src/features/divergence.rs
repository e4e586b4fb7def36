//! Divergence features: cross-sectional dispersion and crowding.
//!
//! Crowding is the mean of the rolling correlation matrix among sector
//! tickers. The diagonal is included; with a fixed ticker set it only shifts
//! the level, which the rolling z-score removes downstream.

use super::{columns, present_tickers, simple_returns};
use crate::domain::Frame;
use crate::stats;

/// Lookback for the pairwise rolling correlation.
pub const CROWDING_WINDOW: usize = 63;

/// Build the divergence feature table. Empty (no columns) when no sector ticker is present.
pub fn compute_divergence_features(prices: &Frame, sector: &[String]) -> Frame {
    let available = present_tickers(prices, sector);
    if available.is_empty() {
        tracing::debug!("no sector tickers in price table; divergence features empty");
        return Frame::new(prices.index.clone());
    }

    let returns = simple_returns(prices, &available).drop_all_undefined_rows();
    let n = returns.nrows();

    let dispersion: Vec<f64> = (0..n)
        .map(|i| stats::std_dev(&returns.row(i, &available), 1))
        .collect();
    let crowding = average_rolling_correlation(&returns, &available, CROWDING_WINDOW);

    let mut features = Frame::new(returns.index.clone());
    features.insert(columns::AI_DISPERSION, dispersion);
    features.insert(columns::AI_CROWDING_CORR, crowding);
    features
}

/// Per row: mean over columns of the column-mean of the rolling correlation matrix.
fn average_rolling_correlation(returns: &Frame, tickers: &[&str], window: usize) -> Vec<f64> {
    let n = returns.nrows();
    let k = tickers.len();
    let series: Vec<&[f64]> = tickers
        .iter()
        .filter_map(|t| returns.values(t))
        .collect();

    let mut out = vec![f64::NAN; n];
    if n < window {
        return out;
    }
    for i in (window - 1)..n {
        let start = i + 1 - window;
        let mut matrix = vec![vec![f64::NAN; k]; k];
        for a in 0..k {
            for b in a..k {
                let c = stats::pearson(&series[a][start..=i], &series[b][start..=i], window);
                matrix[a][b] = c;
                matrix[b][a] = c;
            }
        }
        let column_means: Vec<f64> = matrix.iter().map(|col| stats::mean(col)).collect();
        out[i] = stats::mean(&column_means);
    }
    out
}
