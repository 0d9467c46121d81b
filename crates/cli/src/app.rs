//! Process-wide state: config, caps, ledger, recent results, and the admin log.

use scorecap_audit::{AdminAction, AuditLogger, AuditOutcome, JsonlSink, TracingSink};
use scorecap_config::AppConfig;
use scorecap_core::{CapSet, Error, StateStore};
use scorecap_ledger::{CapRegistry, JsonFileStore, Ledger, RecentResults};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct App {
    pub config: AppConfig,
    pub caps: CapRegistry,
    pub ledger: Ledger,
    pub recent: RecentResults,
    pub audit: AuditLogger,
    store: Arc<dyn StateStore>,
}

impl App {
    /// Build the app on top of the JSON files in the configured data directory.
    pub fn open(config: AppConfig) -> Self {
        let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::new(
            config.limits_path(),
            config.data_path(),
            config.log_path(),
        ));
        Self::with_store(config, store)
    }

    /// Build the app on top of any store. Load failures fall back to defaults.
    pub fn with_store(config: AppConfig, store: Arc<dyn StateStore>) -> Self {
        let caps = CapRegistry::load(store.clone(), config.default_caps);
        if let Some(e) = &caps.warning {
            eprintln!("  ⚠️  Could not load caps, using defaults: {e}");
        }
        let ledger = Ledger::load(store.clone());
        if let Some(e) = &ledger.warning {
            eprintln!("  ⚠️  Could not load assignments, starting empty: {e}");
        }

        let mut audit = AuditLogger::with_sinks(vec![Box::new(TracingSink)]);
        match store.load_log_destination() {
            Ok(Some(destination)) => match JsonlSink::open(&destination) {
                Ok(sink) => audit.set_destination(Some(sink)),
                Err(e) => warn!(%destination, error = %e, "Admin log destination unavailable"),
            },
            Ok(None) => debug!("No admin log destination configured"),
            Err(e) => warn!(error = %e, "Failed to load admin log destination"),
        }

        Self {
            config,
            caps: caps.value,
            ledger: ledger.value,
            recent: RecentResults::new(),
            audit,
            store,
        }
    }

    pub fn operator(&self) -> &str {
        self.config.operator_name()
    }

    pub fn caps(&self) -> CapSet {
        self.caps.get()
    }

    /// Record a successful admin action as the current operator.
    pub fn record(&self, action: AdminAction, target: &str) {
        self.audit.success(self.operator(), action, target);
    }

    /// Record an action that was applied in memory but could not be saved.
    ///
    /// Errors raised before any change was made are not logged.
    pub fn record_unsaved(&self, action: AdminAction, target: &str, error: &Error) {
        if let Error::Persistence(_) = error {
            self.audit.log(
                self.operator(),
                action,
                target,
                AuditOutcome::Failure,
                Some(error.to_string()),
            );
        }
    }

    /// Point the admin log at `path` and remember it for later runs.
    pub fn set_log_destination(&mut self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let sink = JsonlSink::open(path)?;
        let destination = path.display().to_string();
        self.audit.set_destination(Some(sink));
        let action = AdminAction::LogDestinationChanged {
            destination: destination.clone(),
        };
        if let Err(e) = self.store.save_log_destination(&destination) {
            let message = format!("Admin log set for this session only: {e}");
            self.record_unsaved(action, &destination, &Error::Persistence(e));
            return Err(message.into());
        }
        self.record(action, &destination);
        Ok(())
    }
}
