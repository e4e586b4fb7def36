//! Report context: biggest weekly movers and plain-language callouts.
//!
//! Everything here reads finished component scores; nothing feeds back into
//! the index.

use serde::{Deserialize, Serialize};

use fragility_core::scoring::{Component, ComponentScores, CompositeIndex};
use fragility_core::stats;

/// Minimum defined deltas before a mover's sigma is reported.
pub const MOVER_MIN_PERIODS: usize = 10;

/// Channels a contained shock has not reached: component and the level below
/// which it counts as calm.
pub const PROPAGATION_CHANNELS: [(Component, f64); 3] = [
    (Component::Volatility, 35.0),
    (Component::Crowding, 35.0),
    (Component::Narrative, 20.0),
];

/// A component ranked by the size of its latest weekly change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    pub component: Component,
    pub delta: f64,
    /// Latest delta over the rolling std of deltas. `None` with too little history.
    pub sigma: Option<f64>,
}

impl Mover {
    pub fn label(&self) -> &'static str {
        self.component.label()
    }

    /// `"+1.3σ"`, or empty when sigma is unknown.
    pub fn sigma_text(&self) -> String {
        match self.sigma {
            Some(s) if !s.is_nan() => format!("{s:+.1}σ"),
            _ => String::new(),
        }
    }
}

/// Top `top_n` components by absolute latest delta.
///
/// Sigma divides the latest delta by the sample std of the last `window`
/// deltas; a zero std gives sigma 0.
pub fn compute_movers(components: &ComponentScores, window: usize, top_n: usize) -> Vec<Mover> {
    if components.index().len() < 2 {
        return Vec::new();
    }

    let mut movers: Vec<Mover> = Component::ALL
        .iter()
        .filter_map(|&component| {
            let values = components.values(component)?;
            let deltas = stats::diff(values, 1);
            let delta = *deltas.last()?;
            if delta.is_nan() {
                return None;
            }
            let start = deltas.len().saturating_sub(window);
            let recent = &deltas[start..];
            let sigma = if stats::defined(recent).len() >= MOVER_MIN_PERIODS {
                let std = stats::std_dev(recent, 1);
                if std.is_nan() {
                    None
                } else if std == 0.0 {
                    Some(0.0)
                } else {
                    Some(delta / std)
                }
            } else {
                None
            };
            Some(Mover {
                component,
                delta,
                sigma,
            })
        })
        .collect();

    movers.sort_by(|a, b| b.delta.abs().total_cmp(&a.delta.abs()));
    movers.truncate(top_n);
    movers
}

/// Latest score per component, NaN where undefined.
pub fn latest_scores(components: &ComponentScores) -> Vec<(Component, f64)> {
    Component::ALL
        .iter()
        .map(|&c| (c, components.latest(c)))
        .collect()
}

fn score_of(latest: &[(Component, f64)], component: Component) -> f64 {
    latest
        .iter()
        .find(|(c, _)| *c == component)
        .map_or(f64::NAN, |(_, v)| *v)
}

/// A maxed component under a calm composite reads as contained stress.
///
/// Returns `None` unless the composite is below 50 and some component is
/// above 90.
pub fn containment_message(composite_value: f64, latest: &[(Component, f64)]) -> Option<String> {
    if !(composite_value < 50.0) {
        return None;
    }
    let max = latest
        .iter()
        .map(|(_, v)| *v)
        .filter(|v| !v.is_nan())
        .fold(f64::NEG_INFINITY, f64::max);
    if !(max > 90.0) {
        return None;
    }

    let calm: Vec<&str> = PROPAGATION_CHANNELS
        .iter()
        .filter(|(c, threshold)| score_of(latest, *c) < *threshold)
        .map(|(c, _)| c.as_str())
        .collect();

    Some(if calm.is_empty() {
        "One component is maxed, but propagation channels remain muted; the stress appears contained."
            .to_string()
    } else {
        format!(
            "One component is maxed, but it has not yet propagated into {}; the stress appears contained.",
            calm.join(", ")
        )
    })
}

/// Calm macro with hot sector flows points at a sector-specific problem.
pub fn macro_sector_callout(latest: &[(Component, f64)]) -> Option<String> {
    let macro_liquidity = score_of(latest, Component::MacroLiquidity);
    let capital = score_of(latest, Component::CapitalFlow);
    let revenue = score_of(latest, Component::RevenueReality);
    if macro_liquidity < 35.0 && (capital > 60.0 || revenue > 60.0) {
        Some(
            "Macro conditions are relatively calm; current fragility appears sector-specific \
             (idiosyncratic) rather than systemic."
                .to_string(),
        )
    } else {
        None
    }
}

/// Everything a report or dashboard shows beyond the raw tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportContext {
    pub movers: Vec<Mover>,
    pub containment_message: Option<String>,
    pub macro_sector_callout: Option<String>,
}

impl ReportContext {
    pub fn build(composite: &CompositeIndex, components: &ComponentScores) -> Self {
        let latest = latest_scores(components);
        let composite_value = composite.latest().map_or(f64::NAN, |r| r.index);
        Self {
            movers: compute_movers(components, 104, 5),
            containment_message: containment_message(composite_value, &latest),
            macro_sector_callout: macro_sector_callout(&latest),
        }
    }
}
