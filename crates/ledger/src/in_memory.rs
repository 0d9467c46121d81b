//! In-memory store — useful for testing and throwaway sessions.

use scorecap_core::error::StorageError;
use scorecap_core::{CapSet, RecordSet, StateStore};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct Documents {
    caps: Option<CapSet>,
    ledger: Option<RecordSet>,
    log_destination: Option<String>,
}

/// A store that keeps every document in process memory.
///
/// Writes can be made to fail on demand to exercise persistence-failure paths.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    docs: Mutex<Documents>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn docs(&self) -> std::sync::MutexGuard<'_, Documents> {
        self.docs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_writable(&self, what: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Write {
                path: format!("memory://{what}"),
                reason: "writes disabled".into(),
            });
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl StateStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn load_caps(&self) -> Result<Option<CapSet>, StorageError> {
        Ok(self.docs().caps)
    }

    fn save_caps(&self, caps: &CapSet) -> Result<(), StorageError> {
        self.check_writable("caps")?;
        self.docs().caps = Some(*caps);
        Ok(())
    }

    fn load_ledger(&self) -> Result<Option<RecordSet>, StorageError> {
        Ok(self.docs().ledger.clone())
    }

    fn save_ledger(&self, records: &RecordSet) -> Result<(), StorageError> {
        self.check_writable("ledger")?;
        self.docs().ledger = Some(records.clone());
        Ok(())
    }

    fn load_log_destination(&self) -> Result<Option<String>, StorageError> {
        Ok(self.docs().log_destination.clone())
    }

    fn save_log_destination(&self, destination: &str) -> Result<(), StorageError> {
        self.check_writable("log_destination")?;
        self.docs().log_destination = Some(destination.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_and_load() {
        let store = InMemoryStore::new();
        assert!(store.load_caps().unwrap().is_none());
        store.save_caps(&CapSet::default()).unwrap();
        assert_eq!(store.load_caps().unwrap(), Some(CapSet::default()));
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn failing_writes_leave_documents_untouched() {
        let store = InMemoryStore::new();
        store.set_fail_writes(true);
        let err = store.save_log_destination("admin.jsonl").unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }));
        assert!(store.load_log_destination().unwrap().is_none());
        assert_eq!(store.write_count(), 0);
    }
}
