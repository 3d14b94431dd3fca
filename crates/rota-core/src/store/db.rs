//! Durable store for cohorts and daily assignment records using redb.
//!
//! # Table design
//!
//! Two tables share the same key shape:
//! ```text
//! COHORTS      "<owner>/<cohort_id>"   -> JSON Cohort
//! ASSIGNMENTS  "<owner>/<YYYY-MM-DD>"  -> JSON AssignmentRecord
//! ```
//!
//! Owner ids are slugs and never contain `/`. Since `'0'` sorts directly
//! after `'/'`, the half-open range `"<owner>/".."<owner>0"` covers exactly
//! one owner's rows. ISO dates sort lexically, so the assignment scan comes
//! back in date order without post-sorting.

use std::path::Path;

use chrono::NaiveDate;
use redb::{Database, ReadableTable, TableDefinition};
use serde::Serialize;

use crate::cohort::{Cohort, CohortReader};
use crate::error::{db_err, Result, RotaError};
use crate::paths::validate_id;
use crate::record::AssignmentRecord;
use crate::rotation::CursorUpdates;

use super::{check_update, AssignmentStore, ConcurrencyMode};

// ---------------------------------------------------------------------------
// Table definitions
// ---------------------------------------------------------------------------

const COHORTS: TableDefinition<&str, &[u8]> = TableDefinition::new("cohorts");
const ASSIGNMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("assignments");

// ---------------------------------------------------------------------------
// Key helpers
// ---------------------------------------------------------------------------

fn cohort_key(owner: &str, cohort_id: &str) -> String {
    format!("{owner}/{cohort_id}")
}

fn assignment_key(owner: &str, date: NaiveDate) -> String {
    format!("{owner}/{}", date.format("%Y-%m-%d"))
}

/// Bounds of a range scan covering every key for `owner`.
fn owner_bounds(owner: &str) -> (String, String) {
    (format!("{owner}/"), format!("{owner}0"))
}

// ---------------------------------------------------------------------------
// RedbStore
// ---------------------------------------------------------------------------

/// Outcome of `RedbStore::upsert_cohorts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
}

pub struct RedbStore {
    db: Database,
    mode: ConcurrencyMode,
}

impl RedbStore {
    /// Open or create the redb database at `path`.
    ///
    /// Creates both tables if they don't already exist.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            crate::io::ensure_dir(parent)?;
        }
        let db = Database::create(path).map_err(db_err)?;
        let wt = db.begin_write().map_err(db_err)?;
        wt.open_table(COHORTS).map_err(db_err)?;
        wt.open_table(ASSIGNMENTS).map_err(db_err)?;
        wt.commit().map_err(db_err)?;
        Ok(Self {
            db,
            mode: ConcurrencyMode::default(),
        })
    }

    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Insert or replace cohorts for `owner` in a single transaction.
    ///
    /// The cursor in `cohorts` is ignored. New cohorts start at 0; an
    /// existing cohort keeps its stored cursor with `keep_cursors` and is
    /// reset to 0 without it.
    pub fn upsert_cohorts(
        &self,
        owner: &str,
        cohorts: &[Cohort],
        keep_cursors: bool,
    ) -> Result<ImportSummary> {
        validate_id(owner)?;
        for cohort in cohorts {
            validate_id(&cohort.id)?;
            if cohort.member_ids.iter().any(|m| m.is_empty()) {
                return Err(RotaError::EmptySubjectId(cohort.id.clone()));
            }
        }

        let mut summary = ImportSummary::default();
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(COHORTS).map_err(db_err)?;
            for cohort in cohorts {
                let key = cohort_key(owner, &cohort.id);
                let existing = table
                    .get(key.as_str())
                    .map_err(db_err)?
                    .map(|v| v.value().to_vec());

                let mut incoming = cohort.clone();
                incoming.rotation_cursor = 0;
                match existing {
                    Some(bytes) => {
                        if keep_cursors {
                            let stored: Cohort = serde_json::from_slice(&bytes)?;
                            incoming.rotation_cursor = stored.rotation_cursor;
                        }
                        summary.updated += 1;
                    }
                    None => summary.created += 1,
                }

                let value = serde_json::to_vec(&incoming)?;
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(db_err)?;
            }
        }
        wt.commit().map_err(db_err)?;
        tracing::debug!(
            owner,
            created = summary.created,
            updated = summary.updated,
            "cohorts upserted"
        );
        Ok(summary)
    }

    pub fn remove_cohort(&self, owner: &str, cohort_id: &str) -> Result<()> {
        let key = cohort_key(owner, cohort_id);
        let wt = self.db.begin_write().map_err(db_err)?;
        let mut table = wt.open_table(COHORTS).map_err(db_err)?;
        let removed = table.remove(key.as_str()).map_err(db_err)?.is_some();
        drop(table);
        if !removed {
            return Err(RotaError::CohortNotFound(cohort_id.to_string()));
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }
}

impl CohortReader for RedbStore {
    fn list_cohorts(&self, owner: &str) -> Result<Vec<Cohort>> {
        let (lower, upper) = owner_bounds(owner);
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(COHORTS).map_err(db_err)?;

        let mut result = Vec::new();
        for entry in table
            .range(lower.as_str()..upper.as_str())
            .map_err(db_err)?
        {
            let (_, v) = entry.map_err(db_err)?;
            let cohort: Cohort = serde_json::from_slice(v.value())?;
            result.push(cohort);
        }
        Ok(result)
    }
}

impl AssignmentStore for RedbStore {
    fn get(&self, owner: &str, date: NaiveDate) -> Result<Option<AssignmentRecord>> {
        let key = assignment_key(owner, date);
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(ASSIGNMENTS).map_err(db_err)?;
        let Some(v) = table.get(key.as_str()).map_err(db_err)? else {
            return Ok(None);
        };
        let record: AssignmentRecord = serde_json::from_slice(v.value())?;
        Ok(Some(record))
    }

    fn put(&self, owner: &str, record: &AssignmentRecord, updates: &CursorUpdates) -> Result<()> {
        let record_key = assignment_key(owner, record.date);
        let record_value = serde_json::to_vec(record)?;

        // Every early return below drops `wt` uncommitted, which aborts it.
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut cohorts = wt.open_table(COHORTS).map_err(db_err)?;
            for (cohort_id, update) in updates {
                let key = cohort_key(owner, cohort_id);
                let existing = cohorts
                    .get(key.as_str())
                    .map_err(db_err)?
                    .map(|v| v.value().to_vec());
                let mut cohort: Option<Cohort> = match existing {
                    Some(bytes) => Some(serde_json::from_slice(&bytes)?),
                    None => None,
                };
                check_update(
                    owner,
                    cohort_id,
                    cohort.as_ref().map(|c| c.rotation_cursor),
                    update,
                    self.mode,
                )?;
                if let Some(cohort) = cohort.as_mut() {
                    cohort.rotation_cursor = update.to;
                    let value = serde_json::to_vec(cohort)?;
                    cohorts
                        .insert(key.as_str(), value.as_slice())
                        .map_err(db_err)?;
                }
            }

            let mut assignments = wt.open_table(ASSIGNMENTS).map_err(db_err)?;
            assignments
                .insert(record_key.as_str(), record_value.as_slice())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;

        tracing::debug!(
            owner,
            date = %record.date,
            selected = record.selected_subject_ids.len(),
            cursors = updates.len(),
            "daily assignment committed"
        );
        Ok(())
    }

    fn list_records(&self, owner: &str) -> Result<Vec<AssignmentRecord>> {
        let (lower, upper) = owner_bounds(owner);
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(ASSIGNMENTS).map_err(db_err)?;

        let mut result = Vec::new();
        for entry in table
            .range(lower.as_str()..upper.as_str())
            .map_err(db_err)?
        {
            let (_, v) = entry.map_err(db_err)?;
            let record: AssignmentRecord = serde_json::from_slice(v.value())?;
            result.push(record);
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
