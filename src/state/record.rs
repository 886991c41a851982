//! Typed access to the persisted rating record.
//!
//! Reads and writes never fail from the caller's point of view: a storage
//! error is logged and the read falls back to the field's default, or the
//! write is dropped. The next call simply tries again.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::keys::{KeySpace, StateKey};
use crate::storage::{KeyValueStore, StoredValue};

/// Snapshot of every persisted field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingState {
    pub current_version: Option<String>,
    pub previous_version: Option<String>,
    /// Epoch seconds, 0 when unset
    pub first_use_date: f64,
    pub use_count: u64,
    pub significant_event_count: u64,
    /// Epoch seconds, 0 when unset
    pub reminder_request_date: f64,
    pub rated_current_version: bool,
    pub rated_previous_version: bool,
    pub rated_any_version: bool,
    pub declined_current_version: bool,
    pub declined_previous_version: bool,
}

/// Reads and writes the rating record for one application identifier.
#[derive(Clone)]
pub struct StateStore {
    store: Arc<dyn KeyValueStore>,
    keys: KeySpace,
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore").field("keys", &self.keys).finish_non_exhaustive()
    }
}

impl StateStore {
    /// Create a state store over a key-value backend.
    pub fn new(store: Arc<dyn KeyValueStore>, identifier: &str) -> Self {
        Self {
            store,
            keys: KeySpace::new(identifier),
        }
    }

    /// The key space in use.
    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    /// Read every field.
    pub fn snapshot(&self) -> RatingState {
        RatingState {
            current_version: self.tracked_version(),
            previous_version: self.read_string(StateKey::PreviousVersion),
            first_use_date: self.first_use_date(),
            use_count: self.use_count(),
            significant_event_count: self.significant_event_count(),
            reminder_request_date: self.reminder_request_date(),
            rated_current_version: self.rated_current_version(),
            rated_previous_version: self.read_bool(StateKey::RatedPreviousVersion),
            rated_any_version: self.rated_any_version(),
            declined_current_version: self.declined_current_version(),
            declined_previous_version: self.read_bool(StateKey::PreviousDeclinedToRate),
        }
    }

    /// Version the counters belong to, if any.
    pub fn tracked_version(&self) -> Option<String> {
        self.read_string(StateKey::CurrentVersion)
    }

    /// Adopt `version` as the tracked version.
    pub fn set_tracked_version(&self, version: &str) {
        self.write(StateKey::CurrentVersion, StoredValue::Str(version.to_string()));
    }

    /// Epoch seconds of the first use, 0 when unset.
    pub fn first_use_date(&self) -> f64 {
        self.read_double(StateKey::FirstUseDate)
    }

    /// Set the first-use timestamp.
    pub fn set_first_use_date(&self, epoch_seconds: f64) {
        self.write(StateKey::FirstUseDate, StoredValue::Double(epoch_seconds));
    }

    /// Uses recorded for the tracked version.
    pub fn use_count(&self) -> u64 {
        self.read_count(StateKey::UseCount)
    }

    /// Set the use count.
    pub fn set_use_count(&self, count: u64) {
        self.write_count(StateKey::UseCount, count);
    }

    /// Significant events recorded for the tracked version.
    pub fn significant_event_count(&self) -> u64 {
        self.read_count(StateKey::SignificantEventCount)
    }

    /// Set the significant event count.
    pub fn set_significant_event_count(&self, count: u64) {
        self.write_count(StateKey::SignificantEventCount, count);
    }

    /// Epoch seconds of the last remind-later answer, 0 when unset.
    pub fn reminder_request_date(&self) -> f64 {
        self.read_double(StateKey::ReminderRequestDate)
    }

    /// Set the remind-later timestamp.
    pub fn set_reminder_request_date(&self, epoch_seconds: f64) {
        self.write(StateKey::ReminderRequestDate, StoredValue::Double(epoch_seconds));
    }

    /// Whether the user rated the tracked version.
    pub fn rated_current_version(&self) -> bool {
        self.read_bool(StateKey::RatedCurrentVersion)
    }

    /// Whether the user ever rated any version.
    pub fn rated_any_version(&self) -> bool {
        self.read_bool(StateKey::RatedAnyVersion)
    }

    /// Record that the user rated the tracked version.
    pub fn mark_rated(&self) {
        self.write(StateKey::RatedCurrentVersion, StoredValue::Bool(true));
        self.write(StateKey::RatedAnyVersion, StoredValue::Bool(true));
    }

    /// Whether the user declined to rate the tracked version.
    pub fn declined_current_version(&self) -> bool {
        self.read_bool(StateKey::DeclinedToRate)
    }

    /// Record that the user declined to rate the tracked version.
    pub fn mark_declined(&self) {
        self.write(StateKey::DeclinedToRate, StoredValue::Bool(true));
    }

    /// Move the tracked version's decisions into the "previous" fields and
    /// clear them for `new_version`.
    pub fn archive_and_adopt(&self, new_version: &str) {
        match self.tracked_version() {
            Some(previous) => self.write(StateKey::PreviousVersion, StoredValue::Str(previous)),
            None => self.remove(StateKey::PreviousVersion),
        }
        let rated = self.rated_current_version();
        let declined = self.declined_current_version();
        self.write(StateKey::RatedPreviousVersion, StoredValue::Bool(rated));
        self.write(StateKey::PreviousDeclinedToRate, StoredValue::Bool(declined));

        self.set_tracked_version(new_version);
        self.write(StateKey::RatedCurrentVersion, StoredValue::Bool(false));
        self.write(StateKey::DeclinedToRate, StoredValue::Bool(false));
        self.set_reminder_request_date(0.0);
    }

    /// Make pending writes durable.
    pub fn flush(&self) {
        if let Err(e) = self.store.flush() {
            log::warn!("Failed to flush rating state: {}", e);
        }
    }

    fn read_string(&self, key: StateKey) -> Option<String> {
        let full = self.keys.key(key);
        self.store.get_string(&full).unwrap_or_else(|e| {
            log::warn!("Failed to read {}: {}", full, e);
            None
        })
    }

    fn read_double(&self, key: StateKey) -> f64 {
        let full = self.keys.key(key);
        self.store.get_double(&full).unwrap_or_else(|e| {
            log::warn!("Failed to read {}: {}", full, e);
            0.0
        })
    }

    fn read_bool(&self, key: StateKey) -> bool {
        let full = self.keys.key(key);
        self.store.get_bool(&full).unwrap_or_else(|e| {
            log::warn!("Failed to read {}: {}", full, e);
            false
        })
    }

    fn read_count(&self, key: StateKey) -> u64 {
        let full = self.keys.key(key);
        let raw = self.store.get_int(&full).unwrap_or_else(|e| {
            log::warn!("Failed to read {}: {}", full, e);
            0
        });
        u64::try_from(raw).unwrap_or(0)
    }

    fn write_count(&self, key: StateKey, count: u64) {
        let clamped = i64::try_from(count).unwrap_or(i64::MAX);
        self.write(key, StoredValue::Int(clamped));
    }

    fn write(&self, key: StateKey, value: StoredValue) {
        let full = self.keys.key(key);
        if let Err(e) = self.store.set(&full, value) {
            log::warn!("Failed to write {}: {}", full, e);
        }
    }

    fn remove(&self, key: StateKey) {
        let full = self.keys.key(key);
        if let Err(e) = self.store.remove(&full) {
            log::warn!("Failed to remove {}: {}", full, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RateGateError, Result};
    use crate::storage::MemoryStore;

    /// Store whose every operation fails.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<StoredValue>> {
            Err(RateGateError::Storage("disk gone".to_string()))
        }
        fn set(&self, _key: &str, _value: StoredValue) -> Result<()> {
            Err(RateGateError::Storage("disk gone".to_string()))
        }
        fn remove(&self, _key: &str) -> Result<()> {
            Err(RateGateError::Storage("disk gone".to_string()))
        }
        fn flush(&self) -> Result<()> {
            Err(RateGateError::Storage("disk gone".to_string()))
        }
    }

    fn memory_state() -> (Arc<MemoryStore>, StateStore) {
        let backend = Arc::new(MemoryStore::new());
        let state = StateStore::new(backend.clone(), "app");
        (backend, state)
    }

    #[test]
    fn test_fresh_state_is_default() {
        let (_backend, state) = memory_state();
        assert_eq!(state.snapshot(), RatingState::default());
    }

    #[test]
    fn test_fields_use_prefixed_keys() {
        let (backend, state) = memory_state();
        state.set_use_count(5);
        assert_eq!(backend.get_int("app_AppRatingUseCount").unwrap(), 5);
    }

    #[test]
    fn test_negative_counts_read_as_zero() {
        let (backend, state) = memory_state();
        backend.set_int("app_AppRatingUseCount", -4).unwrap();
        assert_eq!(state.use_count(), 0);
    }

    #[test]
    fn test_mark_rated_sets_both_flags() {
        let (_backend, state) = memory_state();
        state.mark_rated();
        let snap = state.snapshot();
        assert!(snap.rated_current_version);
        assert!(snap.rated_any_version);
    }

    #[test]
    fn test_archive_and_adopt() {
        let (_backend, state) = memory_state();
        state.set_tracked_version("1.0");
        state.mark_rated();
        state.mark_declined();
        state.set_reminder_request_date(1_700_000_000.0);

        state.archive_and_adopt("2.0");

        let snap = state.snapshot();
        assert_eq!(snap.current_version.as_deref(), Some("2.0"));
        assert_eq!(snap.previous_version.as_deref(), Some("1.0"));
        assert!(snap.rated_previous_version);
        assert!(snap.declined_previous_version);
        assert!(!snap.rated_current_version);
        assert!(!snap.declined_current_version);
        assert!(snap.rated_any_version);
        assert_eq!(snap.reminder_request_date, 0.0);
    }

    #[test]
    fn test_broken_store_reads_defaults() {
        let state = StateStore::new(Arc::new(BrokenStore), "app");
        state.set_use_count(3);
        state.mark_rated();
        state.flush();
        assert_eq!(state.snapshot(), RatingState::default());
    }

    #[test]
    fn test_snapshot_serializes() {
        let (_backend, state) = memory_state();
        state.set_tracked_version("3.1");
        let json = serde_json::to_value(state.snapshot()).unwrap();
        assert_eq!(json["current_version"], "3.1");
        assert_eq!(json["use_count"], 0);
    }
}
