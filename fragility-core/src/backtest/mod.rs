//! Backtest Evaluator: does the composite fire ahead of drawdowns?
//!
//! Stress events are the worst decile of the sector's rolling drawdown.
//! Signals are composite readings at or above a threshold. Each event looks
//! back a fixed number of composite periods for a signal.

pub mod evaluate;
pub mod events;

pub use evaluate::{evaluate_signals, BacktestResult, BacktestSettings};
pub use events::{define_stress_events, StressEvents};
