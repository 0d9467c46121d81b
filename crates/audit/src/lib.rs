//! Admin action log for scorecap.
//!
//! Provides:
//! - **AuditLogger**: In-memory record of every admin action, fanned out to sinks
//! - **TracingSink**: Structured `tracing` output
//! - **JsonlSink**: Append-only JSON lines file, the configurable log destination

pub mod audit;
pub mod jsonl;

pub use audit::{AdminAction, AuditEntry, AuditLogger, AuditOutcome, AuditSink, TracingSink};
pub use jsonl::JsonlSink;
