//! Override parsing — `a=0.3 b=1` style text into validated component values.
//!
//! Tokens are matched anywhere in the text, so surrounding words are ignored:
//!
//! ```text
//! a=0.3 c = 0.75          -> {a: 0.3, c: 0.75}
//! please set B=1          -> {b: 1.0}
//! ```
//!
//! Two modes exist. [`OverrideMode::Partial`] is used when deriving a
//! breakdown from a percentage (any subset of keys, possibly none).
//! [`OverrideMode::Full`] is used when all four components are entered by
//! hand and requires exactly the keys a–d.

use regex_lite::Regex;
use std::collections::{BTreeMap, HashSet};

use crate::component::{CapSet, Component};
use crate::error::ValidationError;

const TOKEN_PATTERN: &str = r"(\w+)\s*=\s*(-?\d+(?:\.\d+)?)";
const CAP_ASSIGNMENT_PATTERN: &str = r"^\s*(\w+)\s*=\s*(-?\d+(?:\.\d+)?)\s*$";

/// Validated component values keyed in canonical order.
pub type OverrideSet = BTreeMap<Component, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideMode {
    /// Any subset of a–d; blank text yields an empty set.
    Partial,
    /// All of a–d must be present; foreign keys are reported as unexpected.
    Full,
}

/// Extract raw `(key, value)` tokens in textual order. Keys are case-folded.
fn tokenize(text: &str) -> Result<Vec<(String, f64)>, ValidationError> {
    let re = Regex::new(TOKEN_PATTERN).map_err(|e| ValidationError::Format(e.to_string()))?;
    re.captures_iter(text)
        .map(|caps| {
            let key = caps[1].to_lowercase();
            let value = caps[2]
                .parse::<f64>()
                .map_err(|_| ValidationError::Format(format!("{} is not a number", &caps[2])))?;
            Ok((key, value))
        })
        .collect()
}

/// Parse and validate override text against the current caps.
pub fn parse_overrides(
    text: &str,
    caps: &CapSet,
    mode: OverrideMode,
) -> Result<OverrideSet, ValidationError> {
    let tokens = tokenize(text)?;

    if tokens.is_empty() {
        if mode == OverrideMode::Partial && text.trim().is_empty() {
            return Ok(OverrideSet::new());
        }
        return Err(ValidationError::Format(
            "use a=... b=... c=... d=...".into(),
        ));
    }

    let mut seen = HashSet::new();
    let mut overrides = OverrideSet::new();

    for (key, value) in tokens {
        if !seen.insert(key.clone()) {
            return Err(ValidationError::DuplicateKey(key));
        }
        let component = match key.parse::<Component>() {
            Ok(component) => component,
            Err(err) => {
                return Err(match mode {
                    OverrideMode::Partial => err,
                    OverrideMode::Full => ValidationError::UnexpectedKey(key),
                });
            }
        };
        caps.check(component, value)?;
        overrides.insert(component, value);
    }

    if mode == OverrideMode::Full {
        let missing: Vec<&str> = Component::ALL
            .iter()
            .filter(|c| !overrides.contains_key(c))
            .map(|c| c.key())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingKey(missing.join(", ")));
        }
    }

    Ok(overrides)
}

/// `require_all` selects [`OverrideMode::Full`]; otherwise [`OverrideMode::Partial`].
pub fn validate_override_text(
    text: &str,
    caps: &CapSet,
    require_all: bool,
) -> Result<OverrideSet, ValidationError> {
    let mode = if require_all {
        OverrideMode::Full
    } else {
        OverrideMode::Partial
    };
    parse_overrides(text, caps, mode)
}

/// Parse a lone `key=value` cap assignment such as `b=0.75`.
///
/// Only the shape is checked here; key and range checks belong to the cap
/// registry.
pub fn parse_cap_assignment(text: &str) -> Result<(String, f64), ValidationError> {
    let re =
        Regex::new(CAP_ASSIGNMENT_PATTERN).map_err(|e| ValidationError::Format(e.to_string()))?;
    let caps = re
        .captures(text)
        .ok_or_else(|| ValidationError::Format("use a=... (a–d only)".into()))?;
    let value = caps[2]
        .parse::<f64>()
        .map_err(|_| ValidationError::Format(format!("{} is not a number", &caps[2])))?;
    Ok((caps[1].to_lowercase(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps() -> CapSet {
        CapSet::default()
    }

    #[test]
    fn partial_parses_subset_case_insensitively() {
        let ov = parse_overrides("A=0.3 c = 0.75", &caps(), OverrideMode::Partial).unwrap();
        assert_eq!(ov.len(), 2);
        assert_eq!(ov[&Component::A], 0.3);
        assert_eq!(ov[&Component::C], 0.75);
    }

    #[test]
    fn partial_blank_text_is_empty_set() {
        let ov = parse_overrides("   ", &caps(), OverrideMode::Partial).unwrap();
        assert!(ov.is_empty());
    }

    #[test]
    fn partial_text_without_tokens_is_format_error() {
        let err = parse_overrides("nothing here", &caps(), OverrideMode::Partial).unwrap_err();
        assert!(matches!(err, ValidationError::Format(_)));
    }

    #[test]
    fn full_mode_requires_tokens() {
        let err = parse_overrides("", &caps(), OverrideMode::Full).unwrap_err();
        assert!(matches!(err, ValidationError::Format(_)));
    }

    #[test]
    fn duplicate_key_is_case_folded() {
        let err = parse_overrides("a=0.1 A=0.2", &caps(), OverrideMode::Partial).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateKey("a".into()));
    }

    #[test]
    fn unknown_key_is_invalid_in_partial_mode() {
        let err = parse_overrides("e=0.5", &caps(), OverrideMode::Partial).unwrap_err();
        assert_eq!(err, ValidationError::InvalidKey("e".into()));
    }

    #[test]
    fn unknown_key_is_unexpected_in_full_mode() {
        let err = parse_overrides("a=0.1 b=0.1 c=0.1 d=0.1 x=1", &caps(), OverrideMode::Full)
            .unwrap_err();
        assert_eq!(err, ValidationError::UnexpectedKey("x".into()));
    }

    #[test]
    fn value_above_cap_is_out_of_range() {
        let err = parse_overrides("a=0.5", &caps(), OverrideMode::Partial).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OutOfRange {
                component: Component::A,
                ..
            }
        ));
    }

    #[test]
    fn negative_value_is_out_of_range() {
        let err = parse_overrides("b=-0.2", &caps(), OverrideMode::Partial).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn full_mode_reports_missing_keys() {
        let err = parse_overrides("a=0.1 c=0.2", &caps(), OverrideMode::Full).unwrap_err();
        assert_eq!(err, ValidationError::MissingKey("b, d".into()));
    }

    #[test]
    fn full_mode_accepts_all_four() {
        let ov = validate_override_text("a=0.3 b=1 c=0.5 d=0", &caps(), true).unwrap();
        assert_eq!(ov.len(), 4);
        assert_eq!(ov[&Component::D], 0.0);
    }

    #[test]
    fn range_is_checked_against_current_caps() {
        let mut raised = caps();
        raised.a = 2.0;
        assert!(validate_override_text("a=1.5", &raised, false).is_ok());
        assert!(validate_override_text("a=1.5", &caps(), false).is_err());
    }

    #[test]
    fn cap_assignment_shape() {
        assert_eq!(parse_cap_assignment("B = 0.75").unwrap(), ("b".into(), 0.75));
        assert!(parse_cap_assignment("b=0.75 c=1").is_err());
        assert!(parse_cap_assignment("b").is_err());
    }
}
