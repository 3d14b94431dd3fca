//! Session-lifetime shortcut for resolved daily lists.
//!
//! The cache has no authority of its own. The reconciler only reads it when
//! the durable store has no record for the date, and a cache failure is
//! treated as a miss.

use crate::types::{OwnerId, SubjectId};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

/// Entries are keyed by (owner, date); a reconciler may serve many owners.
pub trait EphemeralCache {
    fn get(&self, owner: &str, date: NaiveDate) -> Option<BTreeSet<SubjectId>>;
    fn set(&self, owner: &str, date: NaiveDate, ids: &BTreeSet<SubjectId>);
}

impl<T: EphemeralCache + ?Sized> EphemeralCache for &T {
    fn get(&self, owner: &str, date: NaiveDate) -> Option<BTreeSet<SubjectId>> {
        (**self).get(owner, date)
    }

    fn set(&self, owner: &str, date: NaiveDate, ids: &BTreeSet<SubjectId>) {
        (**self).set(owner, date, ids)
    }
}

impl<T: EphemeralCache + ?Sized> EphemeralCache for Arc<T> {
    fn get(&self, owner: &str, date: NaiveDate) -> Option<BTreeSet<SubjectId>> {
        (**self).get(owner, date)
    }

    fn set(&self, owner: &str, date: NaiveDate, ids: &BTreeSet<SubjectId>) {
        (**self).set(owner, date, ids)
    }
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<(OwnerId, NaiveDate), BTreeSet<SubjectId>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EphemeralCache for MemoryCache {
    fn get(&self, owner: &str, date: NaiveDate) -> Option<BTreeSet<SubjectId>> {
        // A poisoned lock reads as a miss.
        self.entries
            .lock()
            .ok()?
            .get(&(owner.to_string(), date))
            .cloned()
    }

    fn set(&self, owner: &str, date: NaiveDate, ids: &BTreeSet<SubjectId>) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert((owner.to_string(), date), ids.clone());
            }
            Err(_) => tracing::warn!(owner, %date, "ephemeral cache lock poisoned; entry not stored"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_by_date() {
        let cache = MemoryCache::new();
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let tuesday = monday.succ_opt().unwrap();
        let ids: BTreeSet<SubjectId> = ["a".to_string()].into_iter().collect();

        assert!(cache.get("me", monday).is_none());
        cache.set("me", monday, &ids);
        assert_eq!(cache.get("me", monday), Some(ids));
        assert!(cache.get("me", tuesday).is_none());
    }

    #[test]
    fn entries_are_scoped_by_owner() {
        let cache = MemoryCache::new();
        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        cache.set("alice", day, &["x".to_string()].into_iter().collect());

        assert!(cache.get("bob", day).is_none());
        assert!(cache.get("alice", day).is_some());
    }

    #[test]
    fn later_set_replaces_entry() {
        let cache = MemoryCache::new();
        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        cache.set("me", day, &["a".to_string()].into_iter().collect());
        cache.set("me", day, &BTreeSet::new());
        assert_eq!(cache.get("me", day), Some(BTreeSet::new()));
    }
}
