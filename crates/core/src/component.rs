//! Score components and the cap set that bounds them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Upper bound accepted when a cap is updated. Caps loaded from disk are not
/// checked against it.
pub const CAP_CEILING: f64 = 10.0;

/// One of the four independently capped contributors to a score.
///
/// The declaration order is the canonical allocation order used by
/// [`decompose`](crate::decompose::decompose).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    A,
    B,
    C,
    D,
}

impl Component {
    /// All components in allocation order.
    pub const ALL: [Component; 4] = [Component::A, Component::B, Component::C, Component::D];

    /// The single-letter key used in override text and persisted files.
    pub fn key(self) -> &'static str {
        match self {
            Component::A => "a",
            Component::B => "b",
            Component::C => "c",
            Component::D => "d",
        }
    }

    /// Human-readable label shown next to the key.
    pub fn label(self) -> &'static str {
        match self {
            Component::A => "Roster",
            Component::B => "Ingame",
            Component::C => "Discord",
            Component::D => "Game Sense",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Component {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "a" => Ok(Component::A),
            "b" => Ok(Component::B),
            "c" => Ok(Component::C),
            "d" => Ok(Component::D),
            other => Err(ValidationError::InvalidKey(other.to_string())),
        }
    }
}

/// Maximum value per component.
///
/// Serialized as `{"a": 0.3, "b": 1.0, "c": 1.0, "d": 1.0}`; all four keys
/// are required, so a partial file fails to parse and falls back to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapSet {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Default for CapSet {
    fn default() -> Self {
        Self {
            a: 0.3,
            b: 1.0,
            c: 1.0,
            d: 1.0,
        }
    }
}

impl CapSet {
    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::A => self.a,
            Component::B => self.b,
            Component::C => self.c,
            Component::D => self.d,
        }
    }

    /// Overwrite a single cap. Range checks belong to the caller.
    pub fn set(&mut self, component: Component, value: f64) {
        match component {
            Component::A => self.a = value,
            Component::B => self.b = value,
            Component::C => self.c = value,
            Component::D => self.d = value,
        }
    }

    /// Sum of the four caps; the denominator for percent conversions.
    pub fn total_weight(&self) -> f64 {
        self.a + self.b + self.c + self.d
    }

    /// Check `value` against `[0, cap]` for `component`.
    pub fn check(&self, component: Component, value: f64) -> Result<(), ValidationError> {
        let max = self.get(component);
        if (0.0..=max).contains(&value) {
            Ok(())
        } else {
            Err(ValidationError::OutOfRange {
                component,
                value,
                max,
            })
        }
    }

    /// Iterate `(component, cap)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Component, f64)> + '_ {
        Component::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}
