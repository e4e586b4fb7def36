//! Series: a single date-indexed column of `f64` values.
//!
//! NaN is the "undefined" marker throughout the engine. Nothing here imputes
//! values unless a fill method is called explicitly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Date-indexed univariate series. `index` is ascending and the same length as `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub index: Vec<NaiveDate>,
    #[serde(with = "undefined_as_null")]
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(index: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        assert_eq!(
            index.len(),
            values.len(),
            "Series index and values must have the same length"
        );
        Self { index, values }
    }

    /// An all-NaN series over the given index.
    pub fn undefined(index: &[NaiveDate]) -> Self {
        Self {
            index: index.to_vec(),
            values: vec![f64::NAN; index.len()],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at an exact date, if the date is in the index.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.index
            .binary_search(&date)
            .ok()
            .map(|pos| self.values[pos])
    }

    /// Apply `f` to every value, keeping the index.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            index: self.index.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Exact-date reindex: dates missing from `self` become NaN.
    pub fn reindex(&self, dates: &[NaiveDate]) -> Self {
        let lookup: HashMap<NaiveDate, f64> = self
            .index
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .collect();
        Self {
            index: dates.to_vec(),
            values: dates
                .iter()
                .map(|d| lookup.get(d).copied().unwrap_or(f64::NAN))
                .collect(),
        }
    }

    /// Forward-fill NaN gaps, filling at most `limit` consecutive positions
    /// after each defined value (`None` = unlimited).
    pub fn ffill(&self, limit: Option<usize>) -> Self {
        Self {
            index: self.index.clone(),
            values: ffill_values(&self.values, limit),
        }
    }

    /// Replace NaN (and ±inf) with `value`.
    pub fn fill_undefined(&self, value: f64) -> Self {
        self.map(|v| if v.is_finite() { v } else { value })
    }

    /// Keep only the rows whose date is on or before `as_of`.
    pub fn truncate_to(&self, as_of: NaiveDate) -> Self {
        let end = self.index.partition_point(|d| *d <= as_of);
        Self {
            index: self.index[..end].to_vec(),
            values: self.values[..end].to_vec(),
        }
    }
}

/// Forward-fill over a raw slice. See [`Series::ffill`].
pub fn ffill_values(values: &[f64], limit: Option<usize>) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut last: Option<f64> = None;
    let mut run = 0usize;
    for &v in values {
        if !v.is_nan() {
            last = Some(v);
            run = 0;
            out.push(v);
            continue;
        }
        match last {
            Some(prev) if limit.map_or(true, |lim| run < lim) => {
                run += 1;
                out.push(prev);
            }
            _ => out.push(f64::NAN),
        }
    }
    out
}

/// Serde adapter writing NaN as `null` so undefined cells survive JSON.
pub(crate) mod undefined_as_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn to_options(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().map(|v| (!v.is_nan()).then_some(*v)).collect()
    }

    pub fn from_options(values: Vec<Option<f64>>) -> Vec<f64> {
        values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect()
    }

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        to_options(values).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        Vec::<Option<f64>>::deserialize(deserializer).map(from_options)
    }
}
