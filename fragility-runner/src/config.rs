//! Layered monitor configuration.
//!
//! Built-in defaults are serialized to a TOML table, a user file is
//! deep-merged over them (nested tables merge, scalars and arrays replace),
//! and the result is deserialized and validated once. `FRAGILITY_LOG_LEVEL`
//! overrides `general.log_level` last.

use fragility_core::backtest::BacktestSettings;
use fragility_core::scoring::{ScoringError, WeightMap};
use fragility_core::transforms::{NormalizeParams, TransformError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding `general.log_level`.
pub const LOG_LEVEL_ENV: &str = "FRAGILITY_LOG_LEVEL";

/// Weekly periods per year used to turn `rolling_window_years` into a window.
pub const WEEKS_PER_YEAR: f64 = 52.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(String),

    #[error("invalid scoring settings: {0}")]
    Scoring(#[from] TransformError),

    #[error("invalid weights: {0}")]
    Weights(#[from] ScoringError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete monitor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub general: GeneralConfig,
    pub data: DataConfig,
    pub market: MarketConfig,
    #[serde(rename = "macro")]
    pub macro_series: MacroConfig,
    pub scoring: ScoringConfig,
    pub weights: WeightMap,
    pub backtest: BacktestSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub log_level: String,
}

/// File locations for the CSV providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub prices: PathBuf,
    #[serde(rename = "macro")]
    pub macro_series: PathBuf,
    pub filings: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Sector tickers.
    pub ai_tickers: Vec<String>,
    /// Reference tickers fetched alongside the sector.
    pub benchmarks: Vec<String>,
    /// Benchmark used for relative strength and the macro proxy.
    pub benchmark: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroConfig {
    /// Engine series name → provider series id.
    pub series: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub rolling_window_years: f64,
    pub winsorize_quantiles: [f64; 2],
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let tickers = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            general: GeneralConfig {
                log_level: "info".into(),
            },
            data: DataConfig {
                prices: PathBuf::from("data/prices.csv"),
                macro_series: PathBuf::from("data/macro.csv"),
                filings: PathBuf::from("data/filings.csv"),
            },
            market: MarketConfig {
                ai_tickers: tickers(&[
                    "NVDA", "MSFT", "GOOGL", "AMZN", "META", "AMD", "AVGO", "TSM", "ASML",
                ]),
                benchmarks: tickers(&["SPY", "QQQ"]),
                benchmark: "SPY".into(),
            },
            macro_series: MacroConfig {
                series: BTreeMap::from([
                    ("hy_spread".to_string(), "BAMLH0A0HYM2".to_string()),
                    ("vix".to_string(), "VIXCLS".to_string()),
                ]),
            },
            scoring: ScoringConfig {
                rolling_window_years: 2.0,
                winsorize_quantiles: [0.05, 0.95],
            },
            weights: WeightMap::default(),
            backtest: BacktestSettings::default(),
        }
    }
}

impl MonitorConfig {
    /// Load defaults, optionally merged with a TOML file, then apply the
    /// environment override and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p).map_err(|source| ConfigError::Io {
                    path: p.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };
        if let Ok(level) = std::env::var(LOG_LEVEL_ENV) {
            if !level.trim().is_empty() {
                config.general.log_level = level;
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse a user TOML document and deep-merge it over the defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let user: toml::Table =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut merged = Self::default_table()?;
        deep_merge(&mut merged, user);
        toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn default_table() -> Result<toml::Table, ConfigError> {
        match toml::Value::try_from(Self::default()) {
            Ok(toml::Value::Table(table)) => Ok(table),
            Ok(_) => Err(ConfigError::Parse("defaults did not serialize to a table".into())),
            Err(e) => Err(ConfigError::Parse(e.to_string())),
        }
    }

    /// Rolling window in weekly periods: `floor(rolling_window_years * 52)`.
    pub fn window_periods(&self) -> usize {
        (self.scoring.rolling_window_years * WEEKS_PER_YEAR).floor() as usize
    }

    /// Validated normalization settings.
    pub fn normalize_params(&self) -> Result<NormalizeParams, ConfigError> {
        let [lower_q, upper_q] = self.scoring.winsorize_quantiles;
        Ok(NormalizeParams::new(self.window_periods(), lower_q, upper_q)?)
    }

    /// Sector tickers followed by benchmarks, without duplicates.
    pub fn all_tickers(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for t in self.market.ai_tickers.iter().chain(&self.market.benchmarks) {
            if !out.contains(t) {
                out.push(t.clone());
            }
        }
        if !out.contains(&self.market.benchmark) {
            out.push(self.market.benchmark.clone());
        }
        out
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.market.ai_tickers.is_empty() {
            return Err(ConfigError::Invalid("market.ai_tickers is empty".into()));
        }
        if !self.scoring.rolling_window_years.is_finite() || self.scoring.rolling_window_years <= 0.0
        {
            return Err(ConfigError::Invalid(format!(
                "scoring.rolling_window_years must be positive, got {}",
                self.scoring.rolling_window_years
            )));
        }
        self.normalize_params()?;
        self.weights.validate()?;
        if !self.backtest.threshold.is_finite() {
            return Err(ConfigError::Invalid("backtest.threshold must be finite".into()));
        }
        Ok(())
    }
}

/// Merge `overlay` into `base`: tables merge recursively, anything else replaces.
pub fn deep_merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                deep_merge(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
