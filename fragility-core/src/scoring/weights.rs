//! Composite weights.

use super::{Component, ScoringError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Component → non-negative weight. Weights need not sum to 1; the composite
/// renormalizes over whichever weighted components are present per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct WeightMap(BTreeMap<Component, f64>);

impl WeightMap {
    pub fn new(weights: impl IntoIterator<Item = (Component, f64)>) -> Self {
        Self(weights.into_iter().collect())
    }

    pub fn get(&self, component: Component) -> Option<f64> {
        self.0.get(&component).copied()
    }

    /// Weighted components in component order.
    pub fn iter(&self) -> impl Iterator<Item = (Component, f64)> + '_ {
        self.0.iter().map(|(c, w)| (*c, *w))
    }

    pub fn components(&self) -> Vec<Component> {
        self.0.keys().copied().collect()
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        match self.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
            Some((component, weight)) => Err(ScoringError::InvalidWeight { component, weight }),
            None => Ok(()),
        }
    }
}

impl TryFrom<BTreeMap<String, f64>> for WeightMap {
    type Error = String;

    fn try_from(named: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        named
            .into_iter()
            .map(|(name, w)| {
                Component::from_name(&name)
                    .map(|c| (c, w))
                    .ok_or_else(|| format!("unknown component '{name}'"))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(WeightMap)
    }
}

impl From<WeightMap> for BTreeMap<String, f64> {
    fn from(weights: WeightMap) -> Self {
        weights
            .0
            .into_iter()
            .map(|(c, w)| (c.as_str().to_string(), w))
            .collect()
    }
}

impl Default for WeightMap {
    fn default() -> Self {
        Self::new([
            (Component::CapitalFlow, 0.20),
            (Component::RevenueReality, 0.15),
            (Component::ModelEconomics, 0.15),
            (Component::Narrative, 0.20),
            (Component::MacroLiquidity, 0.30),
        ])
    }
}
