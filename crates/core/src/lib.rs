//! # scorecap core
//!
//! Domain types, traits, and error definitions for scorecap.
//! This crate has **zero framework dependencies** — it defines the domain model
//! that the storage, audit, and CLI crates implement against.
//!
//! A performance score is the sum of four capped components (a–d) expressed
//! as a percentage of the total weight (the sum of the caps). The two
//! interesting pieces live here:
//! - [`overrides`] turns `a=0.3 c=1` style text into validated values
//! - [`decompose`] rebuilds a plausible a/b/c/d split from a percentage
//!
//! Persistence is defined as the [`StateStore`] trait; implementations live
//! in `scorecap-ledger`.

pub mod breakdown;
pub mod component;
pub mod decompose;
pub mod error;
pub mod overrides;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use breakdown::{
    Breakdown, BreakdownRecord, COMMENT_MAX_CHARS, Note, RecordSet, entity_key, filter_records,
    round_places,
};
pub use component::{CAP_CEILING, CapSet, Component};
pub use decompose::decompose;
pub use error::{Error, LedgerError, Result, StorageError, ValidationError};
pub use overrides::{OverrideMode, OverrideSet, parse_cap_assignment, parse_overrides, validate_override_text};
pub use store::{Loaded, StateStore};
