//! Cache reconciler: resolves the daily list for (owner, date).
//!
//! Each resolution walks an explicit state machine:
//!
//! ```text
//! CheckDurable ─┬─ record, same fingerprint ──▶ MatchFound ──▶ Done (durable)
//!               ├─ record, new fingerprint ───▶ Mismatch ───▶ Recompute
//!               └─ no record ─────────────────▶ Absent ─┬───▶ Done (cache)
//!                                                       └───▶ Recompute
//! Recompute ──▶ Done (computed) | Done (error, empty selection)
//! ```
//!
//! `force_recompute` starts at `Recompute`. Only `Recompute` writes to the
//! durable store. Cohorts are read once per resolution and that snapshot
//! feeds both the fingerprint comparison and the recomputation.

use crate::cache::EphemeralCache;
use crate::cohort::{Cohort, CohortReader};
use crate::error::ErrorKind;
use crate::fingerprint::SettingsFingerprint;
use crate::record::AssignmentRecord;
use crate::rotation::compute_rotation;
use crate::store::AssignmentStore;
use crate::types::SubjectId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Source / Resolution
// ---------------------------------------------------------------------------

/// Where a resolved selection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Durable,
    Cache,
    Computed,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Source::Durable => "durable",
            Source::Cache => "cache",
            Source::Computed => "computed",
        };
        f.write_str(s)
    }
}

/// Result of `resolve_daily_assignment`.
///
/// A failed resolution has an empty selection, no source, and an `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub date: NaiveDate,
    pub selected_subject_ids: BTreeSet<SubjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl Resolution {
    fn resolved(date: NaiveDate, ids: BTreeSet<SubjectId>, source: Source) -> Self {
        Self {
            date,
            selected_subject_ids: ids,
            source: Some(source),
            error: None,
        }
    }

    fn failed(date: NaiveDate, kind: ErrorKind) -> Self {
        Self {
            date,
            selected_subject_ids: BTreeSet::new(),
            source: None,
            error: Some(kind),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Step {
    CheckDurable,
    MatchFound(AssignmentRecord),
    Mismatch { stored: SettingsFingerprint },
    Absent,
    Recompute,
    Done(Resolution),
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::CheckDurable => "check_durable",
            Step::MatchFound(_) => "match_found",
            Step::Mismatch { .. } => "mismatch",
            Step::Absent => "absent",
            Step::Recompute => "recompute",
            Step::Done(_) => "done",
        }
    }
}

/// Configuration read once at the start of a resolution.
struct Snapshot<'a> {
    owner: &'a str,
    date: NaiveDate,
    cohorts: Vec<Cohort>,
    fingerprint: SettingsFingerprint,
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

pub struct Reconciler<R, S, C> {
    reader: R,
    store: S,
    cache: C,
}

impl<R, S, C> Reconciler<R, S, C>
where
    R: CohortReader,
    S: AssignmentStore,
    C: EphemeralCache,
{
    pub fn new(reader: R, store: S, cache: C) -> Self {
        Self {
            reader,
            store,
            cache,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Resolve the list of subjects to present for `owner` on `date`.
    ///
    /// Never returns a partial selection: any failure yields an empty set
    /// with `error` set. Errors are not retried here.
    pub fn resolve_daily_assignment(
        &self,
        owner: &str,
        date: NaiveDate,
        force_recompute: bool,
    ) -> Resolution {
        let cohorts = match self.reader.list_cohorts(owner) {
            Ok(cohorts) => cohorts,
            Err(e) => {
                tracing::warn!(owner, %date, error = %e, "cohort configuration unavailable");
                return Resolution::failed(date, ErrorKind::ConfigurationUnavailable);
            }
        };
        let snapshot = Snapshot {
            owner,
            date,
            fingerprint: SettingsFingerprint::compute(date, &cohorts),
            cohorts,
        };

        let mut state = if force_recompute {
            Step::Recompute
        } else {
            Step::CheckDurable
        };
        loop {
            tracing::debug!(owner, %date, state = state.name(), "reconcile step");
            state = match self.step(&snapshot, state) {
                Step::Done(resolution) => {
                    self.log_outcome(owner, &resolution);
                    return resolution;
                }
                next => next,
            };
        }
    }

    fn step(&self, snap: &Snapshot<'_>, state: Step) -> Step {
        match state {
            Step::CheckDurable => match self.store.get(snap.owner, snap.date) {
                Ok(Some(record)) if record.settings_fingerprint == snap.fingerprint => {
                    Step::MatchFound(record)
                }
                Ok(Some(record)) => Step::Mismatch {
                    stored: record.settings_fingerprint,
                },
                Ok(None) => Step::Absent,
                Err(e) => {
                    tracing::warn!(owner = snap.owner, date = %snap.date, error = %e, "durable lookup failed");
                    Step::Done(Resolution::failed(snap.date, e.kind()))
                }
            },

            Step::MatchFound(record) => {
                self.cache.set(snap.owner, snap.date, &record.selected_subject_ids);
                Step::Done(Resolution::resolved(
                    snap.date,
                    record.selected_subject_ids,
                    Source::Durable,
                ))
            }

            Step::Mismatch { stored } => {
                tracing::debug!(
                    owner = snap.owner,
                    date = %snap.date,
                    %stored,
                    current = %snap.fingerprint,
                    "settings changed since the daily list was computed"
                );
                Step::Recompute
            }

            Step::Absent => match self.cache.get(snap.owner, snap.date) {
                Some(ids) => Step::Done(Resolution::resolved(snap.date, ids, Source::Cache)),
                None => Step::Recompute,
            },

            Step::Recompute => {
                let rotation = compute_rotation(snap.date, &snap.cohorts);
                let record = AssignmentRecord::new(
                    snap.date,
                    rotation.selected_subject_ids,
                    snap.fingerprint.clone(),
                );
                match self.store.put(snap.owner, &record, &rotation.cursor_updates) {
                    Ok(()) => {
                        self.cache.set(snap.owner, snap.date, &record.selected_subject_ids);
                        Step::Done(Resolution::resolved(
                            snap.date,
                            record.selected_subject_ids,
                            Source::Computed,
                        ))
                    }
                    Err(e) => {
                        tracing::warn!(owner = snap.owner, date = %snap.date, error = %e, "daily assignment not persisted");
                        Step::Done(Resolution::failed(snap.date, e.kind()))
                    }
                }
            }

            done @ Step::Done(_) => done,
        }
    }

    fn log_outcome(&self, owner: &str, resolution: &Resolution) {
        match (&resolution.source, &resolution.error) {
            (Some(source), _) => tracing::info!(
                owner,
                date = %resolution.date,
                %source,
                selected = resolution.selected_subject_ids.len(),
                "daily assignment resolved"
            ),
            (None, Some(kind)) => tracing::info!(
                owner,
                date = %resolution.date,
                error = %kind,
                "daily assignment failed"
            ),
            (None, None) => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
