//! Signal evaluation against labeled stress events.

use super::StressEvents;
use crate::domain::Series;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestSettings {
    /// Composite level at or above which a signal fires.
    pub threshold: f64,
    /// Composite periods searched before each event, in addition to the
    /// event's own period.
    pub lead_days: usize,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            threshold: 70.0,
            lead_days: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub precision: f64,
    pub recall: f64,
    /// Mean calendar days between an event and its most recent prior signal.
    /// `None` when no event was preceded by a signal.
    pub avg_lead_days: Option<f64>,
    pub events: usize,
    pub signals: usize,
    pub true_positives: usize,
}

impl BacktestResult {
    fn no_events(signals: usize) -> Self {
        Self {
            precision: 0.0,
            recall: 0.0,
            avg_lead_days: None,
            events: 0,
            signals,
            true_positives: 0,
        }
    }
}

/// Score the composite's signals against stress events.
///
/// Precision divides by `max(signals fired, 1)`, so a run with no signals
/// reports 0 rather than an undefined value.
pub fn evaluate_signals(
    index: &Series,
    events: &StressEvents,
    settings: &BacktestSettings,
) -> BacktestResult {
    let fired: Vec<bool> = index.values.iter().map(|v| *v >= settings.threshold).collect();
    let signals = fired.iter().filter(|f| **f).count();

    let event_dates = events.event_dates();
    if event_dates.is_empty() {
        return BacktestResult::no_events(signals);
    }

    let mut true_positives = 0usize;
    let mut leads: Vec<f64> = Vec::new();
    for event in &event_dates {
        let end = index.index.partition_point(|d| d <= event);
        let start = end.saturating_sub(settings.lead_days + 1);
        let latest_signal = (start..end).rev().find(|&i| fired[i]);
        if let Some(i) = latest_signal {
            true_positives += 1;
            leads.push((*event - index.index[i]).num_days() as f64);
        }
    }

    let avg_lead_days = if leads.is_empty() {
        None
    } else {
        Some(leads.iter().sum::<f64>() / leads.len() as f64)
    };

    BacktestResult {
        precision: true_positives as f64 / signals.max(1) as f64,
        recall: true_positives as f64 / event_dates.len() as f64,
        avg_lead_days,
        events: event_dates.len(),
        signals,
        true_positives,
    }
}
