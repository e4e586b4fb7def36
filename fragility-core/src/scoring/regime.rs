//! Regime labels for the composite index.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Regime {
    Calm,
    Warming,
    Elevated,
    Stressed,
    Fragile,
}

impl Regime {
    /// Half-open 20-point bins; 80 and above (100 included) is `Fragile`.
    /// Negative values are `Calm`.
    pub fn from_index(value: f64) -> Regime {
        if value >= 80.0 {
            Regime::Fragile
        } else if value >= 60.0 {
            Regime::Stressed
        } else if value >= 40.0 {
            Regime::Elevated
        } else if value >= 20.0 {
            Regime::Warming
        } else {
            Regime::Calm
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Regime::Calm => "Calm",
            Regime::Warming => "Warming",
            Regime::Elevated => "Elevated",
            Regime::Stressed => "Stressed",
            Regime::Fragile => "Fragile",
        }
    }

    /// Fixed one-sentence reading of the regime.
    pub fn interpretation(self) -> &'static str {
        match self {
            Regime::Calm | Regime::Warming => {
                "Signals suggest stable positioning with contained stress; monitor for divergence shifts."
            }
            Regime::Elevated => {
                "Fragility is building; crowding or narrative decay may be increasing sensitivity."
            }
            Regime::Stressed => {
                "Stress indicators are high; risk appetite appears fragile and crowding elevated."
            }
            Regime::Fragile => {
                "Market structure looks fragile; de-risking and narrative deterioration are pronounced."
            }
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        assert_eq!(Regime::from_index(19.999), Regime::Calm);
        assert_eq!(Regime::from_index(20.0), Regime::Warming);
        assert_eq!(Regime::from_index(39.999), Regime::Warming);
        assert_eq!(Regime::from_index(40.0), Regime::Elevated);
        assert_eq!(Regime::from_index(60.0), Regime::Stressed);
        assert_eq!(Regime::from_index(79.999), Regime::Stressed);
        assert_eq!(Regime::from_index(80.0), Regime::Fragile);
        assert_eq!(Regime::from_index(100.0), Regime::Fragile);
    }

    #[test]
    fn out_of_range_values() {
        assert_eq!(Regime::from_index(-5.0), Regime::Calm);
        assert_eq!(Regime::from_index(150.0), Regime::Fragile);
    }

    #[test]
    fn calm_and_warming_share_a_sentence() {
        assert_eq!(Regime::Calm.interpretation(), Regime::Warming.interpretation());
        assert_ne!(Regime::Elevated.interpretation(), Regime::Fragile.interpretation());
    }
}
