//! Composite Aggregator: weighted blend with a dispersion band.

use super::{ComponentScores, ScoringError, WeightMap};
use crate::domain::Series;
use crate::stats;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeRow {
    pub date: NaiveDate,
    pub index: f64,
    pub band_lower: f64,
    pub band_upper: f64,
}

/// Fully defined composite series, ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeIndex {
    pub rows: Vec<CompositeRow>,
}

impl CompositeIndex {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest(&self) -> Option<&CompositeRow> {
        self.rows.last()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    pub fn index_values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.index).collect()
    }

    /// The index column as a series.
    pub fn index_series(&self) -> Series {
        Series::new(self.dates(), self.index_values())
    }

    pub fn truncate_to(&self, as_of: NaiveDate) -> Self {
        Self {
            rows: self
                .rows
                .iter()
                .take_while(|r| r.date <= as_of)
                .copied()
                .collect(),
        }
    }
}

/// Blend the weighted components row by row.
///
/// Each row uses only the weighted components defined there, with their
/// weights renormalized to sum to 1. The band is the population std of those
/// same raw scores, clipped to [0, 100]. Rows with no defined weighted
/// component are dropped.
pub fn compute_composite(
    scores: &ComponentScores,
    weights: &WeightMap,
) -> Result<CompositeIndex, ScoringError> {
    let weighted: Vec<(&[f64], f64)> = weights
        .iter()
        .filter_map(|(c, w)| scores.values(c).map(|v| (v, w)))
        .collect();
    if weighted.is_empty() {
        return Err(ScoringError::NoWeightedComponents);
    }

    let mut rows = Vec::with_capacity(scores.index().len());
    for (i, date) in scores.index().iter().enumerate() {
        let present: Vec<(f64, f64)> = weighted
            .iter()
            .map(|(values, w)| (values[i], *w))
            .filter(|(v, _)| !v.is_nan())
            .collect();
        if present.is_empty() {
            continue;
        }

        let total_weight: f64 = present.iter().map(|(_, w)| w).sum();
        let index = present.iter().map(|(v, w)| v * w / total_weight).sum::<f64>();
        if !index.is_finite() {
            // All present weights are zero
            continue;
        }

        let raw: Vec<f64> = present.iter().map(|(v, _)| *v).collect();
        let band = stats::std_dev(&raw, 0);
        rows.push(CompositeRow {
            date: *date,
            index,
            band_lower: (index - band).max(0.0),
            band_upper: (index + band).min(100.0),
        });
    }

    if rows.is_empty() {
        return Err(ScoringError::EmptyComposite);
    }
    Ok(CompositeIndex { rows })
}
