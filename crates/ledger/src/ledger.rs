//! The assignment ledger — per-entity breakdown records with one-level undo.
//!
//! Every mutating operation changes the in-memory records first and then
//! rewrites the whole ledger through the [`StateStore`]. A failed write is
//! returned as [`Error::Persistence`] but the mutation is kept, so the next
//! successful write catches the store up.

use scorecap_core::{
    Breakdown, BreakdownRecord, COMMENT_MAX_CHARS, CapSet, Component, Error, LedgerError,
    Loaded, Note, OverrideSet, RecordSet, Result, StateStore, ValidationError, decompose,
    entity_key, filter_records, round_places,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::caps::{CapChange, CapChangeListener, Clamp};
use crate::recent::ManualResult;

/// Result of a single-component adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    pub component: Component,
    pub old_value: f64,
    pub new_value: f64,
    pub percent: f64,
}

/// Result of setting a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentUpdate {
    pub comment: String,
    pub truncated: bool,
}

/// Result of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub dropped: usize,
}

/// Stored records plus the single undo slot per entity.
pub struct Ledger {
    records: RecordSet,
    undo: HashMap<String, BreakdownRecord>,
    store: Arc<dyn StateStore>,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("records", &self.records.len())
            .field("undo_slots", &self.undo.len())
            .field("store", &self.store.name())
            .finish()
    }
}

impl Ledger {
    pub fn new(records: RecordSet, store: Arc<dyn StateStore>) -> Self {
        Self {
            records,
            undo: HashMap::new(),
            store,
        }
    }

    /// Load the persisted ledger, starting empty if it is missing or unreadable.
    pub fn load(store: Arc<dyn StateStore>) -> Loaded<Self> {
        let loaded = Loaded::or_default("ledger", store.load_ledger(), RecordSet::new);
        loaded.map(|records| Self::new(records, store))
    }

    pub fn get(&self, entity: &str) -> Option<&BreakdownRecord> {
        self.records.get(&entity_key(entity))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, sorted by key.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &BreakdownRecord)> {
        self.records.iter()
    }

    /// All records, highest percent first. Ties are ordered by key.
    pub fn ranked(&self) -> Vec<(&String, &BreakdownRecord)> {
        let mut ranked: Vec<_> = self.records.iter().collect();
        ranked.sort_by(|(ka, ra), (kb, rb)| rb.percent.total_cmp(&ra.percent).then(ka.cmp(kb)));
        ranked
    }

    pub fn has_undo(&self, entity: &str) -> bool {
        self.undo.contains_key(&entity_key(entity))
    }

    /// Store a fully specified record, replacing any existing one.
    pub fn assign_full(
        &mut self,
        entity: &str,
        percent: f64,
        breakdown: Breakdown,
        note: Note,
        caps: &CapSet,
    ) -> Result<BreakdownRecord> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(ValidationError::PercentOutOfRange(percent).into());
        }
        breakdown.validate(caps)?;

        let record = BreakdownRecord::new(percent, breakdown, note);
        self.store_record(entity_key(entity), record.clone())?;
        Ok(record)
    }

    /// Decompose `percent` (honoring `overrides`) and store the result.
    pub fn assign_from_breakdown(
        &mut self,
        entity: &str,
        percent: f64,
        overrides: &OverrideSet,
        caps: &CapSet,
    ) -> Result<BreakdownRecord> {
        let breakdown = decompose(percent, overrides, caps)?;
        let note = if overrides.is_empty() {
            Note::Approx
        } else {
            Note::Overridden
        };
        self.assign_full(entity, percent, breakdown, note, caps)
    }

    /// Store a hand-entered result. All four values were given, so the note is `Overridden`.
    pub fn assign_recent(
        &mut self,
        entity: &str,
        result: &ManualResult,
        caps: &CapSet,
    ) -> Result<BreakdownRecord> {
        self.assign_full(
            entity,
            result.percent,
            result.breakdown,
            Note::Overridden,
            caps,
        )
    }

    /// Set exactly one component of an existing record and recompute its percent.
    ///
    /// The note is left as it was. Applying the same adjustment twice leaves
    /// the record unchanged the second time.
    pub fn adjust(
        &mut self,
        entity: &str,
        overrides: &OverrideSet,
        caps: &CapSet,
    ) -> Result<Adjustment> {
        let key = entity_key(entity);
        if !self.records.contains_key(&key) {
            return Err(LedgerError::NotFound(entity.to_string()).into());
        }

        let mut values = overrides.iter();
        let (&component, &value) = match (values.next(), overrides.len()) {
            (Some(pair), 1) => pair,
            (None, _) => {
                return Err(ValidationError::Format(
                    "specify one component, e.g. b=0.75".into(),
                )
                .into());
            }
            (Some(_), n) => return Err(ValidationError::TooManyFields(n).into()),
        };
        caps.check(component, value)?;

        // Caps read from disk may carry more than 3 decimals.
        let new_value = round_places(value, 3).min(caps.get(component));
        let Some(record) = self.records.get_mut(&key) else {
            return Err(LedgerError::NotFound(entity.to_string()).into());
        };
        let old_value = record.breakdown.get(component);
        record.breakdown.set(component, new_value);
        record.percent = round_places(record.breakdown.percent_of(caps), 2);
        let percent = record.percent;

        info!(entity = %key, %component, old_value, new_value, percent, "Record adjusted");
        self.persist()?;

        Ok(Adjustment {
            component,
            old_value,
            new_value,
            percent,
        })
    }

    /// Restore the record saved by the last assignment, consuming the slot.
    pub fn undo(&mut self, entity: &str) -> Result<BreakdownRecord> {
        let key = entity_key(entity);
        let Some(previous) = self.undo.remove(&key) else {
            return Err(LedgerError::NoUndoAvailable(entity.to_string()).into());
        };

        info!(entity = %key, "Assignment undone");
        self.records.insert(key, previous.clone());
        self.persist()?;
        Ok(previous)
    }

    /// Clamp every stored `component` above `new_cap` after a cap shrink.
    ///
    /// Clamped records get their percent recomputed against `caps` and the
    /// note `Revalidated`. Raising a cap changes nothing.
    pub fn revalidate(
        &mut self,
        caps: &CapSet,
        component: Component,
        old_cap: f64,
        new_cap: f64,
    ) -> Result<Vec<Clamp>> {
        if new_cap >= old_cap {
            return Ok(Vec::new());
        }

        let mut clamped = Vec::new();
        for (key, record) in self.records.iter_mut() {
            let old_value = record.breakdown.get(component);
            if old_value <= new_cap {
                continue;
            }
            record.breakdown.set(component, new_cap);
            record.percent = round_places(record.breakdown.percent_of(caps), 2);
            record.note = Note::Revalidated;
            clamped.push(Clamp {
                entity: key.clone(),
                old_value,
                new_value: new_cap,
            });
        }

        if !clamped.is_empty() {
            info!(%component, new_cap, count = clamped.len(), "Records revalidated");
            self.persist()?;
        }
        Ok(clamped)
    }

    /// Move a record to a new key. Undo history stays with the old key.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        let old_key = entity_key(old);
        let new_key = entity_key(new);
        if !self.records.contains_key(&old_key) {
            return Err(LedgerError::NotFound(old.to_string()).into());
        }
        if self.records.contains_key(&new_key) {
            return Err(LedgerError::AlreadyExists(new.to_string()).into());
        }

        if let Some(record) = self.records.remove(&old_key) {
            self.records.insert(new_key.clone(), record);
        }
        info!(from = %old_key, to = %new_key, "Record renamed");
        self.persist()
    }

    pub fn clear(&mut self, entity: &str) -> Result<BreakdownRecord> {
        let key = entity_key(entity);
        let Some(removed) = self.records.remove(&key) else {
            return Err(LedgerError::NotFound(entity.to_string()).into());
        };
        info!(entity = %key, "Record cleared");
        self.persist()?;
        Ok(removed)
    }

    /// Remove every record and return how many there were.
    pub fn wipe_all(&mut self) -> Result<usize> {
        let count = self.records.len();
        self.records.clear();
        warn!(count, "Ledger wiped");
        self.persist()?;
        Ok(count)
    }

    /// Attach a comment, trimmed and cut to [`COMMENT_MAX_CHARS`] characters.
    pub fn set_comment(&mut self, entity: &str, text: &str) -> Result<CommentUpdate> {
        let key = entity_key(entity);
        let Some(record) = self.records.get_mut(&key) else {
            return Err(LedgerError::NotFound(entity.to_string()).into());
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Format("comment text is empty".into()).into());
        }
        let truncated = trimmed.chars().count() > COMMENT_MAX_CHARS;
        let comment: String = trimmed.chars().take(COMMENT_MAX_CHARS).collect();

        record.comment = Some(comment.clone());
        debug!(entity = %key, truncated, "Comment set");
        self.persist()?;
        Ok(CommentUpdate { comment, truncated })
    }

    /// Remove a record's comment. Returns `false` if there was none.
    pub fn clear_comment(&mut self, entity: &str) -> Result<bool> {
        let key = entity_key(entity);
        let Some(record) = self.records.get_mut(&key) else {
            return Err(LedgerError::NotFound(entity.to_string()).into());
        };
        if record.comment.take().is_none() {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// The whole ledger as pretty-printed JSON, in the persisted layout.
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    /// Replace the ledger with the well-formed records in `text`.
    ///
    /// Malformed entries are skipped and counted. If nothing usable remains
    /// the ledger is left untouched.
    pub fn import_json(&mut self, text: &str) -> Result<ImportReport> {
        let (records, report) = Self::parse_import(text)?;
        self.replace_all(records)?;
        Ok(report)
    }

    /// Validate a backup without touching the ledger.
    pub fn parse_import(text: &str) -> Result<(RecordSet, ImportReport)> {
        let raw: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| ValidationError::Format(format!("not valid JSON: {e}")))?;
        let serde_json::Value::Object(map) = raw else {
            return Err(ValidationError::Format("expected a JSON object keyed by entity".into()).into());
        };

        let (records, dropped) = filter_records(map);
        if records.is_empty() {
            return Err(ValidationError::Format("no valid entries found".into()).into());
        }
        let report = ImportReport {
            imported: records.len(),
            dropped,
        };
        Ok((records, report))
    }

    /// Replace every record with `records`. Undo slots are left alone.
    pub fn replace_all(&mut self, records: RecordSet) -> Result<()> {
        self.records = records
            .into_iter()
            .map(|(name, record)| (entity_key(&name), record))
            .collect();
        info!(records = self.records.len(), "Ledger replaced");
        self.persist()
    }

    fn store_record(&mut self, key: String, record: BreakdownRecord) -> Result<()> {
        if let Some(previous) = self.records.insert(key.clone(), record) {
            self.undo.insert(key.clone(), previous);
        }
        info!(entity = %key, "Record assigned");
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        self.store.save_ledger(&self.records).map_err(|e| {
            warn!(error = %e, "Failed to persist ledger");
            Error::Persistence(e)
        })
    }
}

impl CapChangeListener for Ledger {
    fn on_cap_changed(&mut self, caps: &CapSet, change: &CapChange) -> Result<Vec<Clamp>> {
        self.revalidate(caps, change.component, change.old_cap, change.new_cap)
    }
}
