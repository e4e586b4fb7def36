//! Fragility Core — scoring and evaluation engine for the sector fragility index.
//!
//! This crate contains everything between raw tables and scores:
//! - Domain types (date-indexed series and frames, weekly calendar, filing records)
//! - Transform Library (winsorize, rolling robust z-score, logistic rescale)
//! - Feature Builders for market, divergence, narrative and macro signals
//! - Component Scorer, Composite Aggregator and regime labels
//! - Backtest Evaluator against drawdown stress events
//! - Data provider traits (no I/O happens here)

pub mod backtest;
pub mod data;
pub mod domain;
pub mod features;
pub mod scoring;
pub mod stats;
pub mod transforms;
