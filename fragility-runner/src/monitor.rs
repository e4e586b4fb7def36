//! Monitor pipeline: wires providers, features, scoring and the backtest.
//!
//! Two entry points:
//! - `run_monitor()`: fetches inputs through the provider traits, then runs. Used by the CLI.
//! - `run_monitor_from_data()`: takes pre-loaded tables. No I/O.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fragility_core::backtest::{define_stress_events, evaluate_signals, BacktestResult};
use fragility_core::data::{DataError, FilingDataProvider, MacroDataProvider, MarketDataProvider};
use fragility_core::features::build_weekly_features;
use fragility_core::scoring::{
    compute_component_scores, compute_composite, Component, ComponentScores, CompositeIndex,
    Regime, ScoringError,
};
use fragility_core::transforms::TransformError;

use crate::config::{ConfigError, MonitorConfig};
use crate::data_loader::{load_inputs, LoadedData};

/// Errors from the monitor. The first three name the stage that ran out of data.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("no market data: {0}")]
    NoData(String),

    #[error("market features could not be computed: {0}")]
    NoFeatures(String),

    #[error("composite index is empty after scoring: {0}")]
    NoComposite(String),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("transform error: {0}")]
    Transform(#[from] TransformError),
}

impl From<ScoringError> for MonitorError {
    fn from(e: ScoringError) -> Self {
        MonitorError::NoComposite(e.to_string())
    }
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Latest score of one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentReading {
    pub component: Component,
    pub label: String,
    /// `None` when undefined.
    pub score: Option<f64>,
}

/// Latest reading of the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub as_of: NaiveDate,
    pub index: f64,
    pub regime: Regime,
    /// One reading per component, in canonical order.
    pub components: Vec<ComponentReading>,
    pub interpretation: String,
}

impl Summary {
    /// Summary at the last composite row.
    pub fn from_latest(composite: &CompositeIndex, components: &ComponentScores) -> Option<Self> {
        let latest = composite.latest()?;
        let regime = Regime::from_index(latest.index);
        Some(Self {
            as_of: latest.date,
            index: latest.index,
            regime,
            components: Component::ALL
                .iter()
                .map(|&component| {
                    let v = components.latest(component);
                    ComponentReading {
                        component,
                        label: component.label().to_string(),
                        score: (!v.is_nan()).then_some(v),
                    }
                })
                .collect(),
            interpretation: regime.interpretation().to_string(),
        })
    }

    /// Latest score of `component`, `None` when undefined.
    pub fn component(&self, component: Component) -> Option<f64> {
        self.components
            .iter()
            .find(|r| r.component == component)
            .and_then(|r| r.score)
    }
}

/// Complete result of one monitor run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub composite: CompositeIndex,
    pub components: ComponentScores,
    pub summary: Summary,
    pub backtest: BacktestResult,
    pub dataset_hash: String,
    pub has_synthetic: bool,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl MonitorResult {
    /// Trim composite and components to rows on or before `as_of` and
    /// recompute the summary. The backtest keeps the full history.
    ///
    /// Returns `None` when nothing remains on or before `as_of`.
    pub fn truncate_as_of(&self, as_of: NaiveDate) -> Option<MonitorResult> {
        let composite = self.composite.truncate_to(as_of);
        let components = self.components.truncate_to(as_of);
        let summary = Summary::from_latest(&composite, &components)?;
        Some(MonitorResult {
            schema_version: self.schema_version,
            composite,
            components,
            summary,
            backtest: self.backtest,
            dataset_hash: self.dataset_hash.clone(),
            has_synthetic: self.has_synthetic,
        })
    }
}

/// Run the monitor: load inputs through the providers, then score.
pub fn run_monitor(
    config: &MonitorConfig,
    market: &dyn MarketDataProvider,
    macro_provider: &dyn MacroDataProvider,
    filing_provider: &dyn FilingDataProvider,
) -> Result<MonitorResult, MonitorError> {
    config.validate()?;
    let loaded = load_inputs(config, market, macro_provider, filing_provider)?;
    run_monitor_from_data(config, &loaded)
}

/// Run the monitor over pre-loaded tables; no I/O.
pub fn run_monitor_from_data(
    config: &MonitorConfig,
    loaded: &LoadedData,
) -> Result<MonitorResult, MonitorError> {
    if loaded.prices.is_empty() {
        return Err(MonitorError::NoData(
            "price table is empty; check the market data source".into(),
        ));
    }

    let sector = &config.market.ai_tickers;
    let benchmark = config.market.benchmark.as_str();

    let features = build_weekly_features(
        &loaded.prices,
        &loaded.macro_series,
        &loaded.filings,
        sector,
        benchmark,
    )
    .map_err(|e| MonitorError::NoFeatures(e.to_string()))?;
    if features.calendar.is_empty() {
        return Err(MonitorError::NoFeatures("weekly calendar is empty".into()));
    }
    if loaded.filings.is_empty() {
        tracing::warn!("no filing signals; narrative components will be undefined");
    }
    if loaded.macro_series.columns.is_empty() {
        tracing::warn!(benchmark, "macro table empty; macro liquidity uses the drawdown proxy");
    }
    tracing::info!(weeks = features.calendar.len(), "features built");

    let params = config.normalize_params()?;
    let components = compute_component_scores(&features, &params)?;
    let composite = compute_composite(&components, &config.weights)?;
    tracing::info!(rows = composite.len(), "composite computed");

    let summary = Summary::from_latest(&composite, &components)
        .ok_or_else(|| MonitorError::NoComposite("no composite rows".into()))?;

    // Stress events come from daily sector returns, not the weekly calendar.
    let events = define_stress_events(&features.daily_sector_returns);
    let backtest = evaluate_signals(&composite.index_series(), &events, &config.backtest);
    tracing::info!(
        events = backtest.events,
        signals = backtest.signals,
        precision = backtest.precision,
        recall = backtest.recall,
        "backtest evaluated"
    );

    Ok(MonitorResult {
        schema_version: SCHEMA_VERSION,
        composite,
        components,
        summary,
        backtest,
        dataset_hash: loaded.dataset_hash.clone(),
        has_synthetic: loaded.has_synthetic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::SyntheticProvider;
    use fragility_core::data::StaticProvider;
    use fragility_core::domain::Frame;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn empty_prices_is_no_data() {
        let config = MonitorConfig::default();
        let empty = StaticProvider::default();
        let err = run_monitor(&config, &empty, &empty, &empty).unwrap_err();
        assert!(matches!(err, MonitorError::NoData(_)));
        assert!(err.to_string().contains("no market data"));
    }

    #[test]
    fn missing_sector_is_no_features() {
        let mut prices = Frame::new(vec![d(2024, 1, 2), d(2024, 1, 3)]);
        prices.insert("SPY", vec![470.0, 471.0]);
        let provider = StaticProvider {
            prices,
            ..Default::default()
        };
        let err = run_monitor(&MonitorConfig::default(), &provider, &provider, &provider).unwrap_err();
        assert!(matches!(err, MonitorError::NoFeatures(_)));
    }

    #[test]
    fn short_history_is_no_composite() {
        // Too few weeks for any rolling z-score
        let synthetic = SyntheticProvider::new(d(2024, 1, 1), d(2024, 2, 15));
        let err =
            run_monitor(&MonitorConfig::default(), &synthetic, &synthetic, &synthetic).unwrap_err();
        assert!(matches!(err, MonitorError::NoComposite(_)));
    }

    #[test]
    fn truncate_as_of_recomputes_summary() {
        let synthetic = SyntheticProvider::new(d(2019, 1, 1), d(2023, 12, 31));
        let result =
            run_monitor(&MonitorConfig::default(), &synthetic, &synthetic, &synthetic).unwrap();
        let cutoff = result.composite.rows[result.composite.len() / 2].date;

        let truncated = result.truncate_as_of(cutoff).unwrap();
        assert_eq!(truncated.summary.as_of, cutoff);
        assert!(truncated.composite.rows.iter().all(|r| r.date <= cutoff));
        assert_eq!(truncated.summary.regime, Regime::from_index(truncated.summary.index));
        assert_eq!(truncated.backtest, result.backtest);
        assert_eq!(
            truncated.summary.components.first().map(|r| r.component),
            Some(Component::ALL[0])
        );

        assert!(result.truncate_as_of(d(2000, 1, 1)).is_none());
    }
}
