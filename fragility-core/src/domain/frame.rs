//! Frame: a date-indexed table of named `f64` columns.
//!
//! Price tables, macro tables, feature tables and component score tables are
//! all frames. Columns are kept in name order so iteration is deterministic.

use super::calendar::{week_ending_friday, weekly_fridays};
use super::series::{ffill_values, Series};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub index: Vec<NaiveDate>,
    #[serde(with = "columns_serde")]
    pub columns: BTreeMap<String, Vec<f64>>,
}

mod columns_serde {
    use super::super::series::undefined_as_null::{from_options, to_options};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        columns: &BTreeMap<String, Vec<f64>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        columns
            .iter()
            .map(|(name, values)| (name.as_str(), to_options(values)))
            .collect::<BTreeMap<_, _>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, Vec<f64>>, D::Error> {
        let raw = BTreeMap::<String, Vec<Option<f64>>>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(name, values)| (name, from_options(values)))
            .collect())
    }
}

impl Frame {
    /// A frame with the given index and no columns.
    pub fn new(index: Vec<NaiveDate>) -> Self {
        Self {
            index,
            columns: BTreeMap::new(),
        }
    }

    /// Build a frame from `(date, column, value)` observations.
    ///
    /// The index is the sorted union of dates; cells never observed are NaN.
    /// A repeated `(date, column)` keeps the last observation.
    pub fn from_observations<I, S>(observations: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, S, f64)>,
        S: Into<String>,
    {
        let observations: Vec<(NaiveDate, String, f64)> = observations
            .into_iter()
            .map(|(d, c, v)| (d, c.into(), v))
            .collect();
        let index: Vec<NaiveDate> = observations
            .iter()
            .map(|(d, _, _)| *d)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut frame = Frame::new(index);
        for (date, column, value) in observations {
            let Ok(pos) = frame.index.binary_search(&date) else {
                continue;
            };
            let n = frame.index.len();
            frame
                .columns
                .entry(column)
                .or_insert_with(|| vec![f64::NAN; n])[pos] = value;
        }
        frame
    }

    pub fn nrows(&self) -> usize {
        self.index.len()
    }

    /// True when the frame has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.columns.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    /// Raw values of a column.
    pub fn values(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// A column as an owned series.
    pub fn column(&self, name: &str) -> Option<Series> {
        self.columns
            .get(name)
            .map(|v| Series::new(self.index.clone(), v.clone()))
    }

    /// Insert (or replace) a column. Panics on a length mismatch.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        assert_eq!(
            values.len(),
            self.index.len(),
            "column length must match frame index"
        );
        self.columns.insert(name.into(), values);
    }

    /// Insert a series after reindexing it onto this frame's index.
    pub fn insert_series(&mut self, name: impl Into<String>, series: &Series) {
        let aligned = series.reindex(&self.index);
        self.insert(name, aligned.values);
    }

    /// Values of `names` at row `row`, in the order given.
    pub fn row(&self, row: usize, names: &[&str]) -> Vec<f64> {
        names
            .iter()
            .map(|n| self.columns.get(*n).map_or(f64::NAN, |c| c[row]))
            .collect()
    }

    /// Keep only the listed columns (absent names are skipped).
    pub fn select(&self, names: &[&str]) -> Frame {
        let mut out = Frame::new(self.index.clone());
        for name in names {
            if let Some(values) = self.columns.get(*name) {
                out.columns.insert((*name).to_string(), values.clone());
            }
        }
        out
    }

    /// Drop rows where every column is NaN.
    pub fn drop_all_undefined_rows(&self) -> Frame {
        let keep: Vec<usize> = (0..self.nrows())
            .filter(|&i| self.columns.values().any(|c| !c[i].is_nan()))
            .collect();
        self.take_rows(&keep)
    }

    /// Exact-date reindex of every column.
    pub fn reindex(&self, dates: &[NaiveDate]) -> Frame {
        let mut out = Frame::new(dates.to_vec());
        for name in self.columns.keys() {
            if let Some(series) = self.column(name) {
                out.columns
                    .insert(name.clone(), series.reindex(dates).values);
            }
        }
        out
    }

    /// Forward-fill every column. See [`Series::ffill`].
    pub fn ffill(&self, limit: Option<usize>) -> Frame {
        Frame {
            index: self.index.clone(),
            columns: self
                .columns
                .iter()
                .map(|(k, v)| (k.clone(), ffill_values(v, limit)))
                .collect(),
        }
    }

    /// Replace every non-finite cell with `value`.
    pub fn fill_undefined(&self, value: f64) -> Frame {
        Frame {
            index: self.index.clone(),
            columns: self
                .columns
                .iter()
                .map(|(k, v)| {
                    let filled = v
                        .iter()
                        .map(|x| if x.is_finite() { *x } else { value })
                        .collect();
                    (k.clone(), filled)
                })
                .collect(),
        }
    }

    /// Downsample onto the Friday calendar: the last defined value of each
    /// column within each week, then an unlimited forward-fill.
    pub fn resample_weekly_last(&self) -> Frame {
        if self.is_empty() {
            return self.clone();
        }
        let calendar = weekly_fridays(self.index[0], self.index[self.nrows() - 1]);
        let mut out = Frame::new(calendar.clone());
        for (name, values) in &self.columns {
            let mut weekly = vec![f64::NAN; calendar.len()];
            for (date, value) in self.index.iter().zip(values) {
                if value.is_nan() {
                    continue;
                }
                if let Ok(pos) = calendar.binary_search(&week_ending_friday(*date)) {
                    weekly[pos] = *value;
                }
            }
            out.columns.insert(name.clone(), ffill_values(&weekly, None));
        }
        out
    }

    /// Upsample onto the Friday calendar: each Friday takes the most recent
    /// observation on or before it, carried for at most `limit` Fridays that
    /// do not coincide with an observation date.
    pub fn resample_weekly_ffill(&self, limit: usize) -> Frame {
        if self.is_empty() {
            return self.clone();
        }
        let calendar = weekly_fridays(self.index[0], self.index[self.nrows() - 1]);
        let mut out = Frame::new(calendar.clone());
        let sources = pad_indexer(&self.index, &calendar, limit);
        for (name, values) in &self.columns {
            let weekly = sources
                .iter()
                .map(|src| src.map_or(f64::NAN, |i| values[i]))
                .collect();
            out.columns.insert(name.clone(), weekly);
        }
        out
    }

    /// Keep only the rows on or before `as_of`.
    pub fn truncate_to(&self, as_of: NaiveDate) -> Frame {
        let end = self.index.partition_point(|d| *d <= as_of);
        let keep: Vec<usize> = (0..end).collect();
        self.take_rows(&keep)
    }

    fn take_rows(&self, rows: &[usize]) -> Frame {
        Frame {
            index: rows.iter().map(|&i| self.index[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|(k, v)| (k.clone(), rows.iter().map(|&i| v[i]).collect()))
                .collect(),
        }
    }
}

/// For each target date, the position in `source` it pads from.
///
/// An exact date match always maps; otherwise at most `limit` consecutive
/// later targets map to the same source position.
fn pad_indexer(source: &[NaiveDate], targets: &[NaiveDate], limit: usize) -> Vec<Option<usize>> {
    let mut out = Vec::with_capacity(targets.len());
    let mut src: Option<usize> = None;
    let mut fill_count = 0usize;
    let mut next = 0usize;
    for target in targets {
        while next < source.len() && source[next] <= *target {
            src = Some(next);
            fill_count = 0;
            next += 1;
        }
        match src {
            Some(i) if source[i] == *target => out.push(Some(i)),
            Some(i) if fill_count < limit => {
                fill_count += 1;
                out.push(Some(i));
            }
            _ => out.push(None),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn from_observations_unions_dates() {
        let frame = Frame::from_observations(vec![
            (d(2024, 1, 3), "SPY", 101.0),
            (d(2024, 1, 2), "SPY", 100.0),
            (d(2024, 1, 2), "QQQ", 200.0),
        ]);
        assert_eq!(frame.index, vec![d(2024, 1, 2), d(2024, 1, 3)]);
        assert_eq!(frame.values("SPY").unwrap(), &[100.0, 101.0]);
        assert!(frame.values("QQQ").unwrap()[1].is_nan());
    }

    #[test]
    fn resample_weekly_last_takes_last_defined_value() {
        // Mon 2024-01-01 .. Fri 2024-01-05, Mon 2024-01-08
        let mut frame = Frame::new(vec![d(2024, 1, 1), d(2024, 1, 4), d(2024, 1, 5), d(2024, 1, 8)]);
        frame.insert("x", vec![1.0, 2.0, f64::NAN, 4.0]);
        let weekly = frame.resample_weekly_last();
        assert_eq!(weekly.index, vec![d(2024, 1, 5), d(2024, 1, 12)]);
        assert_eq!(weekly.values("x").unwrap(), &[2.0, 4.0]);
    }

    #[test]
    fn resample_weekly_last_forward_fills_empty_weeks() {
        let mut frame = Frame::new(vec![d(2024, 1, 5), d(2024, 1, 19)]);
        frame.insert("x", vec![1.0, 3.0]);
        let weekly = frame.resample_weekly_last();
        assert_eq!(weekly.values("x").unwrap(), &[1.0, 1.0, 3.0]);
    }

    #[test]
    fn resample_weekly_ffill_caps_fill_length() {
        let start = d(2024, 1, 5);
        let late = start + Duration::days(7 * 20);
        let mut frame = Frame::new(vec![start, late]);
        frame.insert("x", vec![1.0, 2.0]);
        let weekly = frame.resample_weekly_ffill(13);
        let x = weekly.values("x").unwrap();
        assert_eq!(x[0], 1.0);
        assert_eq!(x[13], 1.0);
        assert!(x[14].is_nan());
        assert_eq!(x[20], 2.0);
    }

    #[test]
    fn mid_week_observation_fills_from_first_friday() {
        // Wednesday filing: the following Friday is the first filled period.
        let mut frame = Frame::new(vec![d(2024, 1, 3), d(2024, 6, 7)]);
        frame.insert("x", vec![1.0, 2.0]);
        let weekly = frame.resample_weekly_ffill(2);
        let x = weekly.values("x").unwrap();
        assert_eq!(x[0], 1.0);
        assert_eq!(x[1], 1.0);
        assert!(x[2].is_nan());
    }

    #[test]
    fn drop_all_undefined_rows_keeps_partial_rows() {
        let mut frame = Frame::new(vec![d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3)]);
        frame.insert("a", vec![f64::NAN, 1.0, f64::NAN]);
        frame.insert("b", vec![f64::NAN, f64::NAN, 2.0]);
        let kept = frame.drop_all_undefined_rows();
        assert_eq!(kept.index, vec![d(2024, 1, 2), d(2024, 1, 3)]);
    }

    #[test]
    fn undefined_cells_survive_json() {
        let mut frame = Frame::new(vec![d(2024, 1, 1), d(2024, 1, 2)]);
        frame.insert("a", vec![f64::NAN, 1.5]);
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("[null,1.5]"));
        let back: Frame = serde_json::from_str(&json).unwrap();
        assert!(back.values("a").unwrap()[0].is_nan());
        assert_eq!(back.values("a").unwrap()[1], 1.5);
    }
}
