//! Cap registry — the live cap set and its update path.
//!
//! Updating a cap persists the new set and then notifies a
//! [`CapChangeListener`] (normally the [`Ledger`](crate::Ledger)) so that
//! stored records can be brought back under the new bound.

use scorecap_core::{CAP_CEILING, CapSet, Component, Loaded, Result, StateStore, ValidationError, round_places};
use std::sync::Arc;
use tracing::info;

/// A single cap change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapChange {
    pub component: Component,
    pub old_cap: f64,
    pub new_cap: f64,
}

impl CapChange {
    pub fn is_shrink(&self) -> bool {
        self.new_cap < self.old_cap
    }
}

/// A stored value that was lowered to fit a shrunken cap.
#[derive(Debug, Clone, PartialEq)]
pub struct Clamp {
    pub entity: String,
    pub old_value: f64,
    pub new_value: f64,
}

/// Receives cap changes after they have been applied.
pub trait CapChangeListener {
    fn on_cap_changed(&mut self, caps: &CapSet, change: &CapChange) -> Result<Vec<Clamp>>;
}

/// Outcome of [`CapRegistry::set`].
#[derive(Debug, Clone)]
pub struct CapUpdate {
    pub caps: CapSet,
    pub change: CapChange,
    pub clamped: Vec<Clamp>,
}

/// Owns the current caps and persists every change.
pub struct CapRegistry {
    caps: CapSet,
    store: Arc<dyn StateStore>,
}

impl std::fmt::Debug for CapRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapRegistry")
            .field("caps", &self.caps)
            .field("store", &self.store.name())
            .finish()
    }
}

impl CapRegistry {
    pub fn new(caps: CapSet, store: Arc<dyn StateStore>) -> Self {
        Self { caps, store }
    }

    /// Load persisted caps, falling back to `defaults`.
    pub fn load(store: Arc<dyn StateStore>, defaults: CapSet) -> Loaded<Self> {
        let loaded = Loaded::or_default("caps", store.load_caps(), || defaults);
        loaded.map(|caps| Self::new(caps, store))
    }

    pub fn get(&self) -> CapSet {
        self.caps
    }

    pub fn total_weight(&self) -> f64 {
        self.caps.total_weight()
    }

    /// Update the cap named by `key` (`"a"`..`"d"`, case-insensitive).
    pub fn set(
        &mut self,
        key: &str,
        value: f64,
        listener: &mut dyn CapChangeListener,
    ) -> Result<CapUpdate> {
        let component: Component = key.parse()?;
        self.set_component(component, value, listener)
    }

    /// Update one cap, persist it, and run the listener.
    ///
    /// The value must lie in `[0, CAP_CEILING]` and is rounded to 3 decimals.
    /// Both the cap change and the listener's work are kept in memory even if
    /// persisting fails; the first failure is returned.
    pub fn set_component(
        &mut self,
        component: Component,
        value: f64,
        listener: &mut dyn CapChangeListener,
    ) -> Result<CapUpdate> {
        if !(0.0..=CAP_CEILING).contains(&value) {
            return Err(ValidationError::OutOfRange {
                component,
                value,
                max: CAP_CEILING,
            }
            .into());
        }

        let new_cap = round_places(value, 3);
        let old_cap = self.caps.get(component);
        self.caps.set(component, new_cap);
        let change = CapChange {
            component,
            old_cap,
            new_cap,
        };
        info!(%component, old_cap, new_cap, "Cap updated");

        let saved = self.store.save_caps(&self.caps);
        let clamped = listener.on_cap_changed(&self.caps, &change)?;
        saved?;

        Ok(CapUpdate {
            caps: self.caps,
            change,
            clamped,
        })
    }

    /// Re-read caps from the store. On failure the current caps are kept.
    pub fn reload(&mut self) -> Result<()> {
        if let Some(caps) = self.store.load_caps()? {
            self.caps = caps;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryStore;
    use scorecap_core::Error;

    #[derive(Default)]
    struct Recorder {
        changes: Vec<CapChange>,
    }

    impl CapChangeListener for Recorder {
        fn on_cap_changed(&mut self, _caps: &CapSet, change: &CapChange) -> Result<Vec<Clamp>> {
            self.changes.push(*change);
            Ok(vec![])
        }
    }

    fn registry() -> (CapRegistry, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (CapRegistry::new(CapSet::default(), store.clone()), store)
    }

    #[test]
    fn set_rounds_persists_and_notifies() {
        let (mut caps, store) = registry();
        let mut listener = Recorder::default();
        let update = caps.set("B", 0.12345, &mut listener).unwrap();

        assert_eq!(update.caps.b, 0.123);
        assert_eq!(caps.get().b, 0.123);
        assert_eq!(store.load_caps().unwrap().unwrap().b, 0.123);
        assert_eq!(
            listener.changes,
            vec![CapChange {
                component: Component::B,
                old_cap: 1.0,
                new_cap: 0.123
            }]
        );
        assert!(listener.changes[0].is_shrink());
    }

    #[test]
    fn invalid_key_is_rejected() {
        let (mut caps, _) = registry();
        let err = caps.set("e", 1.0, &mut Recorder::default()).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::InvalidKey(_))));
    }

    #[test]
    fn value_outside_ceiling_is_rejected() {
        let (mut caps, store) = registry();
        for value in [-0.5, 10.5] {
            let err = caps.set("a", value, &mut Recorder::default()).unwrap_err();
            assert!(matches!(err, Error::Validation(ValidationError::OutOfRange { .. })));
        }
        assert_eq!(caps.get(), CapSet::default());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn total_weight_tracks_updates() {
        let (mut caps, _) = registry();
        caps.set("d", 2.0, &mut Recorder::default()).unwrap();
        assert!((caps.total_weight() - 4.3).abs() < 1e-9);
    }

    #[test]
    fn persistence_failure_still_applies_change() {
        let (mut caps, store) = registry();
        store.set_fail_writes(true);
        let mut listener = Recorder::default();
        let err = caps.set("c", 0.5, &mut listener).unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
        assert_eq!(caps.get().c, 0.5);
        assert_eq!(listener.changes.len(), 1);
    }

    #[test]
    fn load_falls_back_to_defaults_and_reload_picks_up_changes() {
        let store = Arc::new(InMemoryStore::new());
        let loaded = CapRegistry::load(store.clone(), CapSet::default());
        assert!(loaded.warning.is_none());
        let mut caps = loaded.value;
        assert_eq!(caps.get(), CapSet::default());

        let raised = CapSet {
            a: 1.0,
            ..CapSet::default()
        };
        store.save_caps(&raised).unwrap();
        caps.reload().unwrap();
        assert_eq!(caps.get(), raised);
    }
}
