//! File-based state store — pretty-printed JSON documents.
//!
//! Three files are kept side by side in the data directory:
//!
//! ```text
//! limits.json        {"a": 0.3, "b": 1.0, "c": 1.0, "d": 1.0}
//! assignments.json   {"alice": {"percent": 50.0, "a": 0.3, ..., "note": "approx"}}
//! log_channel.json   {"id": "/var/log/scorecap/admin.jsonl"}
//! ```
//!
//! Every save rewrites the whole document. A missing file loads as `None`;
//! an unreadable or unparsable one is reported as a [`StorageError`].

use scorecap_core::breakdown::filter_records;
use scorecap_core::error::StorageError;
use scorecap_core::{CapSet, RecordSet, StateStore};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A JSON-file-backed store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    caps_path: PathBuf,
    ledger_path: PathBuf,
    log_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(caps_path: PathBuf, ledger_path: PathBuf, log_path: PathBuf) -> Self {
        debug!(
            caps = %caps_path.display(),
            ledger = %ledger_path.display(),
            log = %log_path.display(),
            "JSON file store configured"
        );
        Self {
            caps_path,
            ledger_path,
            log_path,
        }
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::Read {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StorageError::Parse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }

    fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Write {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })?;
        }

        let content = serde_json::to_string_pretty(value).map_err(|e| StorageError::Serialize {
            what: path.display().to_string(),
            reason: e.to_string(),
        })?;

        std::fs::write(path, content).map_err(|e| StorageError::Write {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

impl StateStore for JsonFileStore {
    fn name(&self) -> &str {
        "json_file"
    }

    fn load_caps(&self) -> Result<Option<CapSet>, StorageError> {
        Self::read_json(&self.caps_path)
    }

    fn save_caps(&self, caps: &CapSet) -> Result<(), StorageError> {
        Self::write_json(&self.caps_path, caps)
    }

    fn load_ledger(&self) -> Result<Option<RecordSet>, StorageError> {
        let Some(raw) = Self::read_json::<serde_json::Value>(&self.ledger_path)? else {
            return Ok(None);
        };
        let serde_json::Value::Object(map) = raw else {
            return Err(StorageError::Parse {
                path: self.ledger_path.display().to_string(),
                reason: "expected a JSON object keyed by entity".into(),
            });
        };

        let (records, dropped) = filter_records(map);
        if dropped > 0 {
            warn!(dropped, path = %self.ledger_path.display(), "Skipping malformed ledger records");
        }
        debug!(count = records.len(), "Ledger loaded");
        Ok(Some(records))
    }

    fn save_ledger(&self, records: &RecordSet) -> Result<(), StorageError> {
        Self::write_json(&self.ledger_path, records)
    }

    fn load_log_destination(&self) -> Result<Option<String>, StorageError> {
        let Some(raw) = Self::read_json::<serde_json::Value>(&self.log_path)? else {
            return Ok(None);
        };
        Ok(match raw.get("id") {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    fn save_log_destination(&self, destination: &str) -> Result<(), StorageError> {
        Self::write_json(&self.log_path, &serde_json::json!({ "id": destination }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorecap_core::{Breakdown, BreakdownRecord, Note};

    fn store_in(dir: &Path) -> JsonFileStore {
        JsonFileStore::new(
            dir.join("limits.json"),
            dir.join("assignments.json"),
            dir.join("log_channel.json"),
        )
    }

    #[test]
    fn missing_files_load_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.load_caps().unwrap().is_none());
        assert!(store.load_ledger().unwrap().is_none());
        assert!(store.load_log_destination().unwrap().is_none());
    }

    #[test]
    fn caps_persist_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let caps = CapSet {
            a: 0.5,
            b: 1.0,
            c: 2.0,
            d: 1.0,
        };
        store_in(dir.path()).save_caps(&caps).unwrap();
        assert_eq!(store_in(dir.path()).load_caps().unwrap(), Some(caps));
    }

    #[test]
    fn corrupted_caps_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("limits.json"), "{ not json").unwrap();
        let err = store_in(dir.path()).load_caps().unwrap_err();
        assert!(matches!(err, StorageError::Parse { .. }));
    }

    #[test]
    fn ledger_persists_and_skips_malformed_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let mut records = RecordSet::new();
        records.insert(
            "alice".into(),
            BreakdownRecord::new(50.0, Breakdown::new(0.3, 0.446, 0.452, 0.452), Note::Approx),
        );
        store.save_ledger(&records).unwrap();

        let content = std::fs::read_to_string(dir.path().join("assignments.json")).unwrap();
        assert!(content.contains("\"alice\""));
        assert!(content.contains("\"note\": \"approx\""));

        // Hand-edit in a broken entry
        let mut raw: serde_json::Value = serde_json::from_str(&content).unwrap();
        raw["bob"] = serde_json::json!({"a": 1});
        std::fs::write(dir.path().join("assignments.json"), raw.to_string()).unwrap();

        let loaded = store.load_ledger().unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["alice"], records["alice"]);
    }

    #[test]
    fn ledger_that_is_not_an_object_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("assignments.json"), "[1, 2, 3]").unwrap();
        let err = store_in(dir.path()).load_ledger().unwrap_err();
        assert!(matches!(err, StorageError::Parse { .. }));
    }

    #[test]
    fn log_destination_roundtrip_and_numeric_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.save_log_destination("admin.jsonl").unwrap();
        assert_eq!(store.load_log_destination().unwrap().as_deref(), Some("admin.jsonl"));

        std::fs::write(dir.path().join("log_channel.json"), r#"{"id": 1234567890}"#).unwrap();
        assert_eq!(store.load_log_destination().unwrap().as_deref(), Some("1234567890"));
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("data");
        let store = store_in(&nested);
        store.save_caps(&CapSet::default()).unwrap();
        assert!(nested.join("limits.json").exists());
    }
}
