use crate::fingerprint::SettingsFingerprint;
use crate::types::SubjectId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The computed selection for one (owner, date), with the fingerprint it was
/// computed under. At most one exists per (owner, date); recomputation
/// overwrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub date: NaiveDate,
    pub selected_subject_ids: BTreeSet<SubjectId>,
    pub settings_fingerprint: SettingsFingerprint,
    pub computed_at: DateTime<Utc>,
}

impl AssignmentRecord {
    pub fn new(
        date: NaiveDate,
        selected_subject_ids: BTreeSet<SubjectId>,
        settings_fingerprint: SettingsFingerprint,
    ) -> Self {
        Self {
            date,
            selected_subject_ids,
            settings_fingerprint,
            computed_at: Utc::now(),
        }
    }
}
