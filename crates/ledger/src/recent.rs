//! Per-user most recent manual calculation.
//!
//! `calculate` stores what an operator typed so a later `assign` without a
//! percentage can promote it into the ledger.

use scorecap_core::{
    Breakdown, CapSet, Component, LedgerError, OverrideMode, Result, parse_overrides,
};
use std::collections::HashMap;
use tracing::debug;

/// A fully hand-entered breakdown and the percent it works out to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManualResult {
    pub percent: f64,
    pub breakdown: Breakdown,
}

/// Most recent [`ManualResult`] per user. Kept in memory only.
#[derive(Debug, Default)]
pub struct RecentResults {
    by_user: HashMap<String, ManualResult>,
}

impl RecentResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `a=.. b=.. c=.. d=..`, compute the percent, and remember it for `user`.
    pub fn calculate(&mut self, user: &str, text: &str, caps: &CapSet) -> Result<ManualResult> {
        let values = parse_overrides(text, caps, OverrideMode::Full)?;
        let mut breakdown = Breakdown::default();
        for component in Component::ALL {
            breakdown.set(component, values.get(&component).copied().unwrap_or_default());
        }

        let result = ManualResult {
            percent: breakdown.percent_of(caps),
            breakdown,
        };
        debug!(user, percent = result.percent, "Manual result stored");
        self.by_user.insert(user.to_string(), result);
        Ok(result)
    }

    pub fn get(&self, user: &str) -> Option<&ManualResult> {
        self.by_user.get(user)
    }

    /// Like [`get`](Self::get) but fails with `NoRecentResult`.
    pub fn require(&self, user: &str) -> Result<ManualResult> {
        self.get(user)
            .copied()
            .ok_or_else(|| LedgerError::NoRecentResult(user.to_string()).into())
    }
}
