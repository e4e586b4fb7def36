//! Data provider traits and structured error types.
//!
//! Prices, macro series and filing signals each come through their own trait
//! so the pipeline can swap file-backed, synthetic, or test providers without
//! knowing which one it has.

use crate::domain::{FilingSignal, Frame};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("data source not found: {0}")]
    SourceNotFound(String),

    #[error("I/O error reading {path}: {message}")]
    Io { path: String, message: String },

    #[error("parse error in {source_name} at row {row}: {message}")]
    Parse {
        source_name: String,
        row: usize,
        message: String,
    },
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    CsvImport,
    Synthetic,
    InMemory,
}

/// Close prices, one column per ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketData {
    pub prices: Frame,
    pub source: DataSource,
}

/// Macro series keyed by their engine name (`hy_spread`, `vix`).
#[derive(Debug, Clone, PartialEq)]
pub struct MacroData {
    pub series: Frame,
    pub source: DataSource,
}

/// Text-derived filing metrics, one record per (ticker, filing).
#[derive(Debug, Clone, PartialEq)]
pub struct FilingSignals {
    pub metrics: Vec<FilingSignal>,
    pub source: DataSource,
}

/// Source of close prices.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Close prices for `tickers`. Tickers the source does not have are omitted.
    fn fetch_prices(&self, tickers: &[String]) -> Result<MarketData, DataError>;
}

/// Source of macro series.
pub trait MacroDataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// `series` maps engine names to provider series ids
    /// (e.g. `hy_spread` → `BAMLH0A0HYM2`). Missing series are omitted.
    fn fetch_series(&self, series: &BTreeMap<String, String>) -> Result<MacroData, DataError>;
}

/// Source of filing signals.
pub trait FilingDataProvider: Send + Sync {
    fn name(&self) -> &str;

    fn fetch_signals(&self, tickers: &[String]) -> Result<FilingSignals, DataError>;
}

/// In-memory provider over pre-built tables. Serves all three traits.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    pub prices: Frame,
    pub macro_series: Frame,
    pub filings: Vec<FilingSignal>,
}

impl MarketDataProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch_prices(&self, tickers: &[String]) -> Result<MarketData, DataError> {
        let names: Vec<&str> = tickers.iter().map(String::as_str).collect();
        Ok(MarketData {
            prices: self.prices.select(&names),
            source: DataSource::InMemory,
        })
    }
}

impl MacroDataProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch_series(&self, series: &BTreeMap<String, String>) -> Result<MacroData, DataError> {
        let names: Vec<&str> = series.keys().map(String::as_str).collect();
        Ok(MacroData {
            series: self.macro_series.select(&names),
            source: DataSource::InMemory,
        })
    }
}

impl FilingDataProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch_signals(&self, tickers: &[String]) -> Result<FilingSignals, DataError> {
        Ok(FilingSignals {
            metrics: self
                .filings
                .iter()
                .filter(|f| tickers.contains(&f.ticker))
                .cloned()
                .collect(),
            source: DataSource::InMemory,
        })
    }
}
