//! Fragility Runner — monitor orchestration on top of `fragility-core`.
//!
//! This crate provides:
//! - Layered TOML configuration with environment override
//! - CSV and synthetic data providers, plus the dataset hash
//! - The monitor pipeline (features → components → composite → backtest)
//! - Report context: movers, containment and macro callouts
//! - JSON, CSV and Markdown export

pub mod config;
pub mod data_loader;
pub mod explain;
pub mod export;
pub mod monitor;

pub use config::{ConfigError, MonitorConfig};
pub use data_loader::{
    compute_dataset_hash, load_inputs, CsvFilingProvider, CsvMacroProvider, CsvMarketProvider,
    LoadedData, SyntheticProvider,
};
pub use explain::{compute_movers, containment_message, macro_sector_callout, Mover, ReportContext};
pub use monitor::{
    run_monitor, run_monitor_from_data, ComponentReading, MonitorError, MonitorResult, Summary,
};
