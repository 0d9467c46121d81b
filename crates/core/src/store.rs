//! StateStore trait — durable storage for caps, ledger, and log destination.
//!
//! Three independent documents are persisted. Each load returns `Ok(None)`
//! when nothing has been written yet; read and parse failures come back as
//! typed errors so the caller can decide whether to fall back to defaults.

use tracing::warn;

use crate::breakdown::RecordSet;
use crate::component::CapSet;
use crate::error::StorageError;

/// The core StateStore trait.
///
/// Implementations: JSON files on disk, in-memory (for testing).
pub trait StateStore: Send + Sync {
    /// The backend name (e.g., "json_file", "in_memory").
    fn name(&self) -> &str;

    fn load_caps(&self) -> Result<Option<CapSet>, StorageError>;

    fn save_caps(&self, caps: &CapSet) -> Result<(), StorageError>;

    /// Load the ledger. Malformed records are dropped by the implementation.
    fn load_ledger(&self) -> Result<Option<RecordSet>, StorageError>;

    fn save_ledger(&self, records: &RecordSet) -> Result<(), StorageError>;

    fn load_log_destination(&self) -> Result<Option<String>, StorageError>;

    fn save_log_destination(&self, destination: &str) -> Result<(), StorageError>;
}

/// A value loaded with load-or-default semantics.
///
/// `warning` carries the storage failure that forced the default, if any.
#[derive(Debug)]
pub struct Loaded<T> {
    pub value: T,
    pub warning: Option<StorageError>,
}

impl<T> Loaded<T> {
    /// Resolve a store result: missing → default, failure → default plus warning.
    pub fn or_default(
        what: &str,
        result: Result<Option<T>, StorageError>,
        default: impl FnOnce() -> T,
    ) -> Self {
        match result {
            Ok(Some(value)) => Self {
                value,
                warning: None,
            },
            Ok(None) => Self {
                value: default(),
                warning: None,
            },
            Err(e) => {
                warn!(what, error = %e, "Falling back to defaults");
                Self {
                    value: default(),
                    warning: Some(e),
                }
            }
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loaded<U> {
        Loaded {
            value: f(self.value),
            warning: self.warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_value_uses_default_without_warning() {
        let loaded = Loaded::or_default("caps", Ok(None), CapSet::default);
        assert_eq!(loaded.value, CapSet::default());
        assert!(loaded.warning.is_none());
    }

    #[test]
    fn failure_uses_default_and_keeps_warning() {
        let loaded: Loaded<CapSet> = Loaded::or_default(
            "caps",
            Err(StorageError::Parse {
                path: "limits.json".into(),
                reason: "expected value".into(),
            }),
            CapSet::default,
        );
        assert_eq!(loaded.value, CapSet::default());
        assert!(matches!(loaded.warning, Some(StorageError::Parse { .. })));
    }

    #[test]
    fn present_value_is_kept() {
        let caps = CapSet {
            a: 1.0,
            b: 2.0,
            c: 3.0,
            d: 4.0,
        };
        let loaded = Loaded::or_default("caps", Ok(Some(caps)), CapSet::default).map(|c| c.total_weight());
        assert_eq!(loaded.value, 10.0);
    }
}
