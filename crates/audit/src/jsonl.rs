//! JSON-lines file sink — the admin log destination.

use scorecap_core::StorageError;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::audit::{AuditEntry, AuditSink};

/// Appends one JSON object per line to a file.
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlSink {
    /// Open `path` for appending, creating it and its parent directory if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Write {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::Write {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonlSink {
    fn record(&self, entry: &AuditEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize audit entry");
                return;
            }
        };

        let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writeln!(file, "{line}") {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to write admin log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AdminAction, AuditLogger};

    #[test]
    fn entries_are_appended_as_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("admin.jsonl");

        let mut logger = AuditLogger::new();
        logger.set_destination(Some(JsonlSink::open(&path).unwrap()));
        logger.success("mod", AdminAction::Assigned { percent: 42.0 }, "alice");
        logger.success("mod", AdminAction::Cleared, "alice");

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: AuditEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.action, AdminAction::Assigned { percent: 42.0 });
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["action"]["type"], "cleared");
    }

    #[test]
    fn reopening_appends_instead_of_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("admin.jsonl");

        for target in ["first", "second"] {
            let mut logger = AuditLogger::new();
            logger.set_destination(Some(JsonlSink::open(&path).unwrap()));
            logger.success("mod", AdminAction::Undone, target);
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn unopenable_path_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonlSink::open(dir.path()).unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }));
    }
}
