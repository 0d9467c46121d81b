//! Breakdown decomposition — rebuild a/b/c/d from a target percentage.
//!
//! The split is a fixed greedy cascade in the order a → b → c → d:
//!
//! ```text
//! total = percent / 100 * total_weight
//! a = override | min(cap_a, total * 0.20)        rem = total - a
//! b = override | min(cap_b, rem   * 0.33)        rem -= b
//! c = override | min(cap_c, rem   * 0.50)        rem -= c
//! d = override | min(cap_d, max(0, rem))
//! ```
//!
//! The coefficients and the order are part of the contract: overriding an
//! earlier component changes the remainder seen by every later one.

use crate::breakdown::Breakdown;
use crate::component::{CapSet, Component};
use crate::error::{Error, Result, ValidationError};
use crate::overrides::OverrideSet;

/// Share of the whole target claimed by `a`.
pub const SHARE_A: f64 = 0.2;
/// Share of the remainder claimed by `b`.
pub const SHARE_B: f64 = 0.33;
/// Share of the remainder claimed by `c`.
pub const SHARE_C: f64 = 0.5;

/// Largest allowed gap between the unrounded component sum and the target.
pub const SUM_TOLERANCE: f64 = 0.01;

/// Decompose `percent` of the caps' total weight into a full breakdown.
///
/// Components are rounded to 3 decimals after the consistency check.
pub fn decompose(percent: f64, overrides: &OverrideSet, caps: &CapSet) -> Result<Breakdown> {
    if !(0.0..=100.0).contains(&percent) {
        return Err(ValidationError::PercentOutOfRange(percent).into());
    }
    for (&component, &value) in overrides {
        caps.check(component, value)?;
    }

    let total = percent / 100.0 * caps.total_weight();
    let pick = |component: Component, natural: f64| {
        overrides
            .get(&component)
            .copied()
            .unwrap_or_else(|| natural.min(caps.get(component)))
    };

    let a = pick(Component::A, total * SHARE_A);
    let mut remaining = total - a;

    let b = pick(Component::B, remaining * SHARE_B);
    remaining -= b;

    let c = pick(Component::C, remaining * SHARE_C);
    remaining -= c;

    let d = pick(Component::D, remaining.max(0.0));

    let raw = Breakdown::new(a, b, c, d);
    let computed = raw.sum();
    if (computed - total).abs() > SUM_TOLERANCE {
        return Err(Error::InconsistentBreakdown {
            computed,
            expected: total,
        });
    }

    Ok(raw.rounded(3))
}
