//! Text-derived filing metrics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Metrics extracted from one company filing.
///
/// Cadence is irregular (typically quarterly); the narrative builder
/// standardizes per ticker and averages across tickers per filing date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingSignal {
    pub date: NaiveDate,
    pub ticker: String,
    /// Density of AI-related language.
    #[serde(with = "metric_cell")]
    pub ai_density: f64,
    /// Language about pricing pressure and discounting.
    #[serde(with = "metric_cell")]
    pub pricing_pressure: f64,
    /// Risk-factor language intensity.
    #[serde(with = "metric_cell")]
    pub risk_language: f64,
    /// Ratio of efficiency-themed to transformation-themed language.
    #[serde(with = "metric_cell")]
    pub efficiency_transform_ratio: f64,
}

/// The metrics that are standardized per ticker before averaging.
pub const STANDARDIZED_METRICS: [&str; 3] = ["ai_density", "pricing_pressure", "risk_language"];

impl FilingSignal {
    /// Metric value by column name.
    pub fn metric(&self, name: &str) -> Option<f64> {
        match name {
            "ai_density" => Some(self.ai_density),
            "pricing_pressure" => Some(self.pricing_pressure),
            "risk_language" => Some(self.risk_language),
            "efficiency_transform_ratio" => Some(self.efficiency_transform_ratio),
            _ => None,
        }
    }
}

/// A metric that may be missing: empty CSV cells and JSON `null` read as NaN,
/// and NaN writes back as `null`.
mod metric_cell {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        (!value.is_nan()).then_some(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Option::<f64>::deserialize(deserializer).map(|v| v.unwrap_or(f64::NAN))
    }
}
