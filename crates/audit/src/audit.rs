//! Audit logging — one structured entry per administrative change.
//!
//! The most recent entries are kept in memory, every entry is forwarded to
//! each registered [`AuditSink`], and appended to the configured log
//! destination when there is one.

use chrono::{DateTime, Utc};
use scorecap_core::Component;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::jsonl::JsonlSink;

/// A single audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub action: AdminAction,
    pub target: String,
    pub outcome: AuditOutcome,
    pub details: Option<String>,
}

/// Administrative actions worth recording.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdminAction {
    Assigned { percent: f64 },
    Adjusted { component: Component, value: f64, percent: f64 },
    Undone,
    Renamed { to: String },
    Cleared,
    Wiped { count: usize },
    Imported { imported: usize, dropped: usize },
    Exported { path: String },
    CapChanged { component: Component, old_cap: f64, new_cap: f64, clamped: usize },
    CommentSet { truncated: bool },
    CommentCleared,
    LogDestinationChanged { destination: String },
}

/// Outcome of an audited operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure,
    /// A confirmation was declined or timed out.
    Canceled,
}

/// Trait for audit log sinks (where entries are written).
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: &AuditEntry);
}

/// Entries kept in memory by default; older ones live only in the sinks.
pub const DEFAULT_RETAINED_ENTRIES: usize = 1_000;

/// Collects entries and fans them out to sinks.
pub struct AuditLogger {
    entries: Mutex<VecDeque<AuditEntry>>,
    retain: usize,
    sinks: Vec<Box<dyn AuditSink>>,
    destination: Option<JsonlSink>,
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("entry_count", &self.count())
            .field("sink_count", &self.sinks.len())
            .field("destination", &self.destination.as_ref().map(JsonlSink::path))
            .finish()
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLogger {
    /// Create a new audit logger with no sinks.
    pub fn new() -> Self {
        Self::with_sinks(Vec::new())
    }

    pub fn with_sinks(sinks: Vec<Box<dyn AuditSink>>) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            retain: DEFAULT_RETAINED_ENTRIES,
            sinks,
            destination: None,
        }
    }

    /// Keep at most `limit` entries in memory.
    pub fn with_retention(mut self, limit: usize) -> Self {
        self.retain = limit;
        self
    }

    /// Set (or unset) the file that entries are appended to.
    pub fn set_destination(&mut self, destination: Option<JsonlSink>) {
        self.destination = destination;
    }

    pub fn has_destination(&self) -> bool {
        self.destination.is_some()
    }

    /// Record an admin action.
    pub fn log(
        &self,
        actor: &str,
        action: AdminAction,
        target: &str,
        outcome: AuditOutcome,
        details: Option<String>,
    ) {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            actor: actor.into(),
            action,
            target: target.into(),
            outcome,
            details,
        };

        {
            let mut entries = self.lock();
            entries.push_back(entry.clone());
            while entries.len() > self.retain {
                entries.pop_front();
            }
        }

        for sink in &self.sinks {
            sink.record(&entry);
        }

        match &self.destination {
            Some(file) => file.record(&entry),
            None => tracing::debug!(target = %entry.target, "No log destination set, skipping file log"),
        }
    }

    /// Shorthand for a successful action without details.
    pub fn success(&self, actor: &str, action: AdminAction, target: &str) {
        self.log(actor, action, target, AuditOutcome::Success, None);
    }

    /// Get the retained entries, oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn entries_by_outcome(&self, outcome: &AuditOutcome) -> Vec<AuditEntry> {
        self.lock()
            .iter()
            .filter(|e| &e.outcome == outcome)
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<AuditEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A tracing-based audit sink that logs entries via `tracing::info!`.
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn record(&self, entry: &AuditEntry) {
        tracing::info!(
            action = ?entry.action,
            actor = %entry.actor,
            target = %entry.target,
            outcome = ?entry.outcome,
            details = ?entry.details,
            "AUDIT"
        );
    }
}
