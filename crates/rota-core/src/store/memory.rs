use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;

use crate::cohort::{Cohort, CohortReader};
use crate::error::{Result, RotaError};
use crate::paths::validate_id;
use crate::record::AssignmentRecord;
use crate::rotation::CursorUpdates;
use crate::types::OwnerId;

use super::{check_update, AssignmentStore, ConcurrencyMode};

#[derive(Default)]
struct Inner {
    /// Per owner, cohorts in insertion order.
    cohorts: BTreeMap<OwnerId, Vec<Cohort>>,
    records: BTreeMap<(OwnerId, NaiveDate), AssignmentRecord>,
}

/// Non-durable store holding cohorts and records behind one mutex, so a
/// `put` batch is applied under a single lock.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    mode: ConcurrencyMode,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.mode = mode;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| RotaError::PersistenceFailed("memory store lock poisoned".into()))
    }

    /// Insert a cohort, or replace the one with the same id in place.
    pub fn upsert_cohort(&self, owner: &str, cohort: Cohort) -> Result<()> {
        validate_id(owner)?;
        validate_id(&cohort.id)?;
        let mut inner = self.lock()?;
        let cohorts = inner.cohorts.entry(owner.to_string()).or_default();
        match cohorts.iter().position(|c| c.id == cohort.id) {
            Some(i) => cohorts[i] = cohort,
            None => cohorts.push(cohort),
        }
        Ok(())
    }

    pub fn cohort(&self, owner: &str, cohort_id: &str) -> Result<Cohort> {
        let inner = self.lock()?;
        inner
            .cohorts
            .get(owner)
            .and_then(|cs| cs.iter().find(|c| c.id == cohort_id))
            .cloned()
            .ok_or_else(|| RotaError::CohortNotFound(cohort_id.to_string()))
    }
}

impl CohortReader for MemoryStore {
    fn list_cohorts(&self, owner: &str) -> Result<Vec<Cohort>> {
        let inner = self.lock()?;
        Ok(inner.cohorts.get(owner).cloned().unwrap_or_default())
    }
}

impl AssignmentStore for MemoryStore {
    fn get(&self, owner: &str, date: NaiveDate) -> Result<Option<AssignmentRecord>> {
        let inner = self.lock()?;
        Ok(inner.records.get(&(owner.to_string(), date)).cloned())
    }

    fn put(&self, owner: &str, record: &AssignmentRecord, updates: &CursorUpdates) -> Result<()> {
        let mut inner = self.lock()?;

        // Check the whole batch before touching anything.
        let cohorts = inner.cohorts.get(owner);
        for (cohort_id, update) in updates {
            let stored = cohorts
                .and_then(|cs| cs.iter().find(|c| &c.id == cohort_id))
                .map(|c| c.rotation_cursor);
            check_update(owner, cohort_id, stored, update, self.mode)?;
        }

        if let Some(cohorts) = inner.cohorts.get_mut(owner) {
            for cohort in cohorts.iter_mut() {
                if let Some(update) = updates.get(&cohort.id) {
                    cohort.rotation_cursor = update.to;
                }
            }
        }
        inner
            .records
            .insert((owner.to_string(), record.date), record.clone());
        Ok(())
    }

    fn list_records(&self, owner: &str) -> Result<Vec<AssignmentRecord>> {
        let inner = self.lock()?;
        Ok(inner
            .records
            .iter()
            .filter(|((o, _), _)| o == owner)
            .map(|(_, r)| r.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::SettingsFingerprint;
    use crate::rotation::CursorUpdate;
    use crate::types::Quota;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn empty_record() -> AssignmentRecord {
        AssignmentRecord::new(monday(), Default::default(), SettingsFingerprint::default())
    }

    #[test]
    fn upsert_replaces_in_place_and_keeps_order() {
        let store = MemoryStore::new();
        store
            .upsert_cohort("me", Cohort::new("b", Quota::All))
            .unwrap();
        store
            .upsert_cohort("me", Cohort::new("a", Quota::All))
            .unwrap();
        store
            .upsert_cohort("me", Cohort::new("b", Quota::Count(1)))
            .unwrap();

        let ids: Vec<String> = store
            .list_cohorts("me")
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(store.cohort("me", "b").unwrap().quota, Quota::Count(1));
    }

    #[test]
    fn failed_batch_changes_nothing() {
        let store = MemoryStore::new();
        store
            .upsert_cohort("me", Cohort::new("real", Quota::Count(1)).with_members(["a", "b"]))
            .unwrap();

        let mut updates = CursorUpdates::new();
        updates.insert("real".into(), CursorUpdate { from: 0, to: 1 });
        updates.insert("ghost".into(), CursorUpdate { from: 0, to: 1 });

        let err = store.put("me", &empty_record(), &updates).unwrap_err();
        assert!(matches!(err, RotaError::InconsistentBatch(_)));
        assert_eq!(store.cohort("me", "real").unwrap().rotation_cursor, 0);
        assert!(store.get("me", monday()).unwrap().is_none());
    }

    #[test]
    fn expected_cursor_mode_detects_concurrent_advance() {
        let store = MemoryStore::new().with_concurrency(ConcurrencyMode::ExpectedCursor);
        store
            .upsert_cohort(
                "me",
                Cohort::new("c", Quota::Count(1))
                    .with_members(["a", "b", "c"])
                    .with_cursor(1),
            )
            .unwrap();

        let mut updates = CursorUpdates::new();
        updates.insert("c".into(), CursorUpdate { from: 0, to: 1 });
        let err = store.put("me", &empty_record(), &updates).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ConcurrentUpdate);
    }

    #[test]
    fn records_are_per_owner() {
        let store = MemoryStore::new();
        store
            .put("me", &empty_record(), &CursorUpdates::new())
            .unwrap();
        assert_eq!(store.list_records("me").unwrap().len(), 1);
        assert!(store.list_records("you").unwrap().is_empty());
        assert!(store.get("you", monday()).unwrap().is_none());
    }
}
