//! Daily list store adapter.
//!
//! Provides the `AssignmentStore` trait plus two implementations:
//! `RedbStore` (durable, one redb write transaction per `put`) and
//! `MemoryStore` (mutex-guarded maps, for tests and embedding).

pub mod db;
pub mod memory;

pub use db::RedbStore;
pub use memory::MemoryStore;

use crate::error::{Result, RotaError};
use crate::record::AssignmentRecord;
use crate::rotation::{CursorUpdate, CursorUpdates};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// ConcurrencyMode
// ---------------------------------------------------------------------------

/// How `put` treats cursors that moved since they were read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyMode {
    /// Overwrite whatever is stored. Two sessions recomputing the same day
    /// race, and the later write wins.
    #[default]
    LastWriterWins,
    /// Reject the whole batch if any stored cursor differs from the
    /// update's `from`.
    ExpectedCursor,
}

// ---------------------------------------------------------------------------
// AssignmentStore
// ---------------------------------------------------------------------------

pub trait AssignmentStore {
    fn get(&self, owner: &str, date: NaiveDate) -> Result<Option<AssignmentRecord>>;

    /// Overwrite the record for (owner, `record.date`) and apply every cursor
    /// update, all in one batch. Either everything commits or nothing does.
    fn put(&self, owner: &str, record: &AssignmentRecord, updates: &CursorUpdates) -> Result<()>;

    /// All stored records for `owner`, oldest date first.
    fn list_records(&self, owner: &str) -> Result<Vec<AssignmentRecord>>;
}

impl<T: AssignmentStore + ?Sized> AssignmentStore for &T {
    fn get(&self, owner: &str, date: NaiveDate) -> Result<Option<AssignmentRecord>> {
        (**self).get(owner, date)
    }

    fn put(&self, owner: &str, record: &AssignmentRecord, updates: &CursorUpdates) -> Result<()> {
        (**self).put(owner, record, updates)
    }

    fn list_records(&self, owner: &str) -> Result<Vec<AssignmentRecord>> {
        (**self).list_records(owner)
    }
}

impl<T: AssignmentStore + ?Sized> AssignmentStore for Arc<T> {
    fn get(&self, owner: &str, date: NaiveDate) -> Result<Option<AssignmentRecord>> {
        (**self).get(owner, date)
    }

    fn put(&self, owner: &str, record: &AssignmentRecord, updates: &CursorUpdates) -> Result<()> {
        (**self).put(owner, record, updates)
    }

    fn list_records(&self, owner: &str) -> Result<Vec<AssignmentRecord>> {
        (**self).list_records(owner)
    }
}

/// Check one cursor update against the stored cursor (`None` when the
/// cohort is missing) before it joins a batch.
pub(crate) fn check_update(
    owner: &str,
    cohort_id: &str,
    stored: Option<usize>,
    update: &CursorUpdate,
    mode: ConcurrencyMode,
) -> Result<()> {
    let Some(current) = stored else {
        return Err(RotaError::InconsistentBatch(format!(
            "cursor update for unknown cohort '{cohort_id}' (owner '{owner}')"
        )));
    };
    if mode == ConcurrencyMode::ExpectedCursor && current != update.from {
        return Err(RotaError::StaleCursor {
            cohort: cohort_id.to_string(),
            expected: update.from,
            found: current,
        });
    }
    Ok(())
}
