//! Breakdowns and the records stored in the ledger.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tracing::debug;

use crate::component::{CapSet, Component};
use crate::error::ValidationError;

/// Longest comment a record may carry, in characters.
pub const COMMENT_MAX_CHARS: usize = 300;

/// Round `value` to `places` decimal places (half away from zero).
pub fn round_places(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// A full a/b/c/d split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Breakdown {
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::A => self.a,
            Component::B => self.b,
            Component::C => self.c,
            Component::D => self.d,
        }
    }

    pub fn set(&mut self, component: Component, value: f64) {
        match component {
            Component::A => self.a = value,
            Component::B => self.b = value,
            Component::C => self.c = value,
            Component::D => self.d = value,
        }
    }

    pub fn sum(&self) -> f64 {
        self.a + self.b + self.c + self.d
    }

    /// Every component rounded to `places` decimals.
    pub fn rounded(&self, places: i32) -> Self {
        Self {
            a: round_places(self.a, places),
            b: round_places(self.b, places),
            c: round_places(self.c, places),
            d: round_places(self.d, places),
        }
    }

    /// Score as a percentage of the caps' total weight.
    ///
    /// A zero total weight yields 0 rather than NaN.
    pub fn percent_of(&self, caps: &CapSet) -> f64 {
        let total = caps.total_weight();
        if total <= 0.0 {
            return 0.0;
        }
        self.sum() / total * 100.0
    }

    /// Check each component against `[0, cap]`, in canonical order.
    pub fn validate(&self, caps: &CapSet) -> Result<(), ValidationError> {
        for component in Component::ALL {
            caps.check(component, self.get(component))?;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Component, f64)> + '_ {
        Component::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

/// How a record's breakdown came about.
///
/// `Approx` and `Overridden` are set when a record is created. `Revalidated`
/// is only set by the cap revalidation pass and survives adjustments until
/// the record is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Note {
    /// Auto-estimated from a percentage.
    Approx,
    /// At least one component was supplied by hand.
    Overridden,
    /// A component was clamped after its cap shrank.
    Revalidated,
}

impl Note {
    pub fn as_str(self) -> &'static str {
        match self {
            Note::Approx => "approx",
            Note::Overridden => "overridden",
            Note::Revalidated => "revalidated",
        }
    }
}

/// One entity's stored score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRecord {
    pub percent: f64,

    #[serde(flatten)]
    pub breakdown: Breakdown,

    pub note: Note,

    /// Free-form human comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl BreakdownRecord {
    pub fn new(percent: f64, breakdown: Breakdown, note: Note) -> Self {
        Self {
            percent,
            breakdown,
            note,
            comment: None,
        }
    }

    /// Structural checks applied to records read from disk or an import.
    ///
    /// Caps are not consulted: they may have changed since the record was
    /// written, and revalidation is what reconciles that.
    pub fn has_valid_shape(&self) -> bool {
        let percent_ok = self.percent.is_finite() && (0.0..=100.0).contains(&self.percent);
        let components_ok = self
            .breakdown
            .iter()
            .all(|(_, v)| v.is_finite() && v >= 0.0);
        let comment_ok = self
            .comment
            .as_ref()
            .is_none_or(|c| c.chars().count() <= COMMENT_MAX_CHARS);
        percent_ok && components_ok && comment_ok
    }

    /// Parse a single JSON value, returning `None` if it is not a well-formed record.
    pub fn from_json_value(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value::<Self>(value)
            .ok()
            .filter(Self::has_valid_shape)
    }
}

/// All records keyed by normalized entity name.
pub type RecordSet = BTreeMap<String, BreakdownRecord>;

/// Normalize an entity name into its ledger key.
pub fn entity_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Keep only the well-formed records of a JSON object.
///
/// Returns the accepted records and how many entries were dropped. Names
/// that normalize to an already accepted key count as dropped.
pub fn filter_records(raw: serde_json::Map<String, serde_json::Value>) -> (RecordSet, usize) {
    let mut records = RecordSet::new();
    let mut dropped = 0;
    for (name, value) in raw {
        match BreakdownRecord::from_json_value(value) {
            Some(record) => match records.entry(entity_key(&name)) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
                Entry::Occupied(slot) => {
                    debug!(entity = %name, key = %slot.key(), "Dropping record whose key is already taken");
                    dropped += 1;
                }
            },
            None => {
                debug!(entity = %name, "Dropping malformed record");
                dropped += 1;
            }
        }
    }
    (records, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_places_behaves() {
        assert_eq!(round_places(0.45225, 3), 0.452);
        assert_eq!(round_places(1.23456, 2), 1.23);
        assert_eq!(round_places(0.0, 3), 0.0);
    }

    #[test]
    fn percent_of_uses_total_weight() {
        let caps = CapSet::default();
        let b = Breakdown::new(0.3, 1.0, 1.0, 1.0);
        assert!((b.percent_of(&caps) - 100.0).abs() < 1e-9);

        let zero = CapSet {
            a: 0.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
        };
        assert_eq!(b.percent_of(&zero), 0.0);
    }

    #[test]
    fn record_serializes_flat() {
        let record = BreakdownRecord::new(50.0, Breakdown::new(0.3, 0.446, 0.452, 0.452), Note::Approx);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["percent"], json!(50.0));
        assert_eq!(value["a"], json!(0.3));
        assert_eq!(value["note"], json!("approx"));
        assert!(value.get("comment").is_none());
    }

    #[test]
    fn record_without_percent_is_rejected() {
        let value = json!({"a": 0.1, "b": 0.2, "c": 0.3, "d": 0.4, "note": "approx"});
        assert!(BreakdownRecord::from_json_value(value).is_none());
    }

    #[test]
    fn record_with_unknown_note_is_rejected() {
        let value = json!({"percent": 10, "a": 0.1, "b": 0.1, "c": 0.1, "d": 0.03, "note": "guess"});
        assert!(BreakdownRecord::from_json_value(value).is_none());
    }

    #[test]
    fn record_with_negative_component_is_rejected() {
        let value = json!({"percent": 10, "a": -0.1, "b": 0.1, "c": 0.1, "d": 0.03, "note": "approx"});
        assert!(BreakdownRecord::from_json_value(value).is_none());
    }

    #[test]
    fn filter_records_normalizes_keys_and_counts_drops() {
        let raw = json!({
            "Alice": {"percent": 50, "a": 0.3, "b": 0.446, "c": 0.452, "d": 0.452, "note": "approx", "comment": "solid"},
            "bob": {"a": 0.3, "b": 0.446, "c": 0.452, "d": 0.452, "note": "approx"},
            "carol": "not a record"
        });
        let serde_json::Value::Object(map) = raw else {
            panic!("expected object");
        };
        let (records, dropped) = filter_records(map);
        assert_eq!(records.len(), 1);
        assert_eq!(dropped, 2);
        let alice = &records["alice"];
        assert_eq!(alice.comment.as_deref(), Some("solid"));
        assert_eq!(alice.note, Note::Approx);
    }

    #[test]
    fn filter_records_counts_key_collisions_as_dropped() {
        let raw = json!({
            "Alice": {"percent": 50, "a": 0.3, "b": 0.446, "c": 0.452, "d": 0.452, "note": "approx"},
            "alice": {"percent": 20, "a": 0.1, "b": 0.2, "c": 0.2, "d": 0.16, "note": "overridden"}
        });
        let serde_json::Value::Object(map) = raw else {
            panic!("expected object");
        };
        let (records, dropped) = filter_records(map);
        assert_eq!(records.len(), 1);
        assert_eq!(dropped, 1);
        assert!(records.contains_key("alice"));
    }

    #[test]
    fn entity_key_trims_and_lowercases() {
        assert_eq!(entity_key("  Alice "), "alice");
    }
}
