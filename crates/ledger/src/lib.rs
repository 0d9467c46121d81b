//! # scorecap ledger
//!
//! Stateful pieces built on `scorecap-core`:
//! - [`CapRegistry`] — current caps, persisted on every change
//! - [`Ledger`] — per-entity records with one-level undo and cap revalidation
//! - [`RecentResults`] — each operator's last hand-entered calculation
//!
//! plus the two [`StateStore`](scorecap_core::StateStore) implementations.

pub mod caps;
pub mod file_store;
pub mod in_memory;
pub mod ledger;
pub mod recent;

pub use caps::{CapChange, CapChangeListener, CapRegistry, CapUpdate, Clamp};
pub use file_store::JsonFileStore;
pub use in_memory::InMemoryStore;
pub use ledger::{Adjustment, CommentUpdate, ImportReport, Ledger};
pub use recent::{ManualResult, RecentResults};
