//! Component Scorer: one feature and one normalization per component.

use super::Component;
use crate::domain::{Frame, Series};
use crate::features::{columns, WeeklyFeatures};
use crate::transforms::{normalize_score, NormalizeParams, TransformError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Weekly table with exactly one column per [`Component`]. Values are in
/// [0, 100] or NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub table: Frame,
}

impl ComponentScores {
    pub fn index(&self) -> &[NaiveDate] {
        &self.table.index
    }

    pub fn values(&self, component: Component) -> Option<&[f64]> {
        self.table.values(component.as_str())
    }

    pub fn series(&self, component: Component) -> Option<Series> {
        self.table.column(component.as_str())
    }

    /// Value of `component` at the last row, NaN when undefined there.
    pub fn latest(&self, component: Component) -> f64 {
        self.values(component)
            .and_then(|v| v.last().copied())
            .unwrap_or(f64::NAN)
    }

    pub fn truncate_to(&self, as_of: NaiveDate) -> Self {
        Self {
            table: self.table.truncate_to(as_of),
        }
    }
}

/// Source feature for a component and whether it is negated before normalization.
pub fn source_feature(component: Component) -> (&'static str, bool) {
    match component {
        Component::CapitalFlow => (columns::AI_RELATIVE_STRENGTH, false),
        Component::RevenueReality => (columns::AI_PRICE_ACCELERATION, false),
        Component::ModelEconomics => (columns::AI_VOL_OF_VOL, false),
        // Rising efficiency language reads as lower fragility
        Component::Narrative => (columns::EFFICIENCY_TRANSFORM_TREND, true),
        Component::MacroLiquidity => (columns::HY_SPREAD, false),
        Component::Dispersion => (columns::AI_DISPERSION, false),
        Component::Crowding => (columns::AI_CROWDING_CORR, false),
        Component::Volatility => (columns::AI_VOLATILITY, false),
        Component::PricingPressure => (columns::PRICING_PRESSURE, false),
        Component::AiHype => (columns::AI_DENSITY, false),
    }
}

/// Score all ten components on the weekly calendar.
///
/// A missing source feature gives an all-NaN component rather than an error.
pub fn compute_component_scores(
    features: &WeeklyFeatures,
    params: &NormalizeParams,
) -> Result<ComponentScores, TransformError> {
    let n = features.calendar.len();
    let mut table = Frame::new(features.calendar.clone());

    for component in Component::ALL {
        let (feature, inverted) = source_feature(component);
        let scores = match features.column(feature) {
            Some(raw) => {
                let raw: Vec<f64> = if inverted {
                    raw.iter().map(|v| -v).collect()
                } else {
                    raw.to_vec()
                };
                normalize_score(&raw, params.window, params.lower_q, params.upper_q)?
            }
            None => {
                tracing::debug!(%component, feature, "source feature missing; component undefined");
                vec![f64::NAN; n]
            }
        };
        table.insert(component.as_str(), scores);
    }

    Ok(ComponentScores { table })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::weekly_fridays;
    use crate::stats::test_support::{assert_approx, DEFAULT_EPSILON};

    fn features_with(calendar: Vec<NaiveDate>, narrative_trend: Option<Vec<f64>>) -> WeeklyFeatures {
        let n = calendar.len();
        let mut market = Frame::new(calendar.clone());
        market.insert(
            columns::AI_RELATIVE_STRENGTH,
            (0..n).map(|i| (i as f64 * 0.37).sin()).collect(),
        );
        let mut narrative = Frame::new(calendar.clone());
        if let Some(trend) = narrative_trend {
            narrative.insert(columns::EFFICIENCY_TRANSFORM_TREND, trend);
        }
        WeeklyFeatures {
            daily_sector_returns: Series::undefined(&calendar),
            divergence: Frame::new(calendar.clone()),
            macro_features: Frame::new(calendar.clone()),
            calendar,
            market,
            narrative,
        }
    }

    fn calendar(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let end = start + chrono::Duration::days(7 * (n as i64 - 1));
        weekly_fridays(start, end)
    }

    #[test]
    fn table_has_all_ten_columns() {
        let features = features_with(calendar(30), None);
        let scores = compute_component_scores(&features, &NormalizeParams::default()).unwrap();
        assert_eq!(scores.table.columns.len(), 10);
        for c in Component::ALL {
            assert_eq!(scores.values(c).unwrap().len(), 30);
        }
    }

    #[test]
    fn missing_feature_is_all_undefined() {
        let features = features_with(calendar(30), None);
        let scores = compute_component_scores(&features, &NormalizeParams::default()).unwrap();
        assert!(scores.values(Component::Crowding).unwrap().iter().all(|v| v.is_nan()));
        assert!(scores.latest(Component::MacroLiquidity).is_nan());
        // Capital flow has a source and enough history by the last row
        let capital = scores.latest(Component::CapitalFlow);
        assert!((0.0..=100.0).contains(&capital));
    }

    #[test]
    fn narrative_is_inverted() {
        let n = 30;
        let mut trend = vec![0.0; n];
        for (i, v) in trend.iter_mut().enumerate() {
            *v = (i as f64 * 0.5).cos() * 0.1;
        }
        trend[n - 1] = 1.0;
        let features = features_with(calendar(n), Some(trend));
        let params = NormalizeParams::new(20, 0.0, 1.0).unwrap();
        let scores = compute_component_scores(&features, &params).unwrap();
        // A spike up in the trend is a spike down in the score
        assert!(scores.latest(Component::Narrative) < 50.0);
    }

    #[test]
    fn every_score_is_bounded() {
        let features = features_with(calendar(60), Some(vec![0.0; 60]));
        let scores = compute_component_scores(&features, &NormalizeParams::default()).unwrap();
        for values in scores.table.columns.values() {
            assert!(values.iter().all(|v| v.is_nan() || (0.0..=100.0).contains(v)));
        }
        // Constant narrative trend → zero scale → neutral score
        assert_approx(scores.latest(Component::Narrative), 50.0, DEFAULT_EPSILON);
    }
}
