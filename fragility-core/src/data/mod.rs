//! Data provider abstractions

pub mod provider;

pub use provider::{
    DataError, DataSource, FilingDataProvider, FilingSignals, MacroData, MacroDataProvider,
    MarketData, MarketDataProvider, StaticProvider,
};
