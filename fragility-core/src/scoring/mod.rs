//! Scoring: component scores, composite aggregation, regimes.
//!
//! Ten fixed components each map one feature through `normalize_score`. Five
//! of them carry weight in the composite; the other five are diagnostics.

pub mod components;
pub mod composite;
pub mod regime;
pub mod weights;

pub use components::{compute_component_scores, ComponentScores};
pub use composite::{compute_composite, CompositeIndex, CompositeRow};
pub use regime::Regime;
pub use weights::WeightMap;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("no weighted component is present in the component score table")]
    NoWeightedComponents,

    #[error("composite index is undefined at every date")]
    EmptyComposite,

    #[error("weight for {component} must be finite and non-negative, got {weight}")]
    InvalidWeight { component: Component, weight: f64 },
}

/// The closed set of component scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    CapitalFlow,
    RevenueReality,
    ModelEconomics,
    Narrative,
    MacroLiquidity,
    Dispersion,
    Crowding,
    Volatility,
    PricingPressure,
    AiHype,
}

impl Component {
    pub const ALL: [Component; 10] = [
        Component::CapitalFlow,
        Component::RevenueReality,
        Component::ModelEconomics,
        Component::Narrative,
        Component::MacroLiquidity,
        Component::Dispersion,
        Component::Crowding,
        Component::Volatility,
        Component::PricingPressure,
        Component::AiHype,
    ];

    /// Components that carry weight in the default composite.
    pub const WEIGHTED: [Component; 5] = [
        Component::CapitalFlow,
        Component::RevenueReality,
        Component::ModelEconomics,
        Component::Narrative,
        Component::MacroLiquidity,
    ];

    /// Column name in the component score table.
    pub fn as_str(self) -> &'static str {
        match self {
            Component::CapitalFlow => "capital_flow",
            Component::RevenueReality => "revenue_reality",
            Component::ModelEconomics => "model_economics",
            Component::Narrative => "narrative",
            Component::MacroLiquidity => "macro_liquidity",
            Component::Dispersion => "dispersion",
            Component::Crowding => "crowding",
            Component::Volatility => "volatility",
            Component::PricingPressure => "pricing_pressure",
            Component::AiHype => "ai_hype",
        }
    }

    /// Display label used in summaries and reports.
    pub fn label(self) -> &'static str {
        match self {
            Component::CapitalFlow => "Capital Flow",
            Component::RevenueReality => "Revenue Reality",
            Component::ModelEconomics => "Model Economics",
            Component::Narrative => "Narrative",
            Component::MacroLiquidity => "Macro Liquidity",
            Component::Dispersion => "Dispersion",
            Component::Crowding => "Crowding",
            Component::Volatility => "Volatility",
            Component::PricingPressure => "Pricing Pressure",
            Component::AiHype => "AI Hype",
        }
    }

    pub fn from_name(name: &str) -> Option<Component> {
        Component::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
