//! Settings fingerprint: "how many from which cohort" for a date.
//!
//! Captures active, non-empty cohorts and their effective quota. Cursor and
//! member contents are left out, so membership edits do not force a stored
//! daily list to be recomputed; quota and active-day edits do.

use crate::cohort::Cohort;
use crate::types::CohortId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsFingerprint(BTreeMap<CohortId, usize>);

impl SettingsFingerprint {
    pub fn compute(date: NaiveDate, cohorts: &[Cohort]) -> Self {
        let entries = cohorts
            .iter()
            .filter(|c| c.is_active_on(date) && !c.member_ids.is_empty())
            .map(|c| (c.id.clone(), c.effective_quota()))
            .collect();
        Self(entries)
    }

    pub fn entries(&self) -> &BTreeMap<CohortId, usize> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sorted JSON form, stable across processes.
    pub fn canonical(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }
}

impl fmt::Display for SettingsFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.canonical().map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Quota;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn sample() -> Vec<Cohort> {
        vec![
            Cohort::new("friends", Quota::Count(2))
                .with_members(["a", "b", "c"])
                .every_day(),
            Cohort::new("family", Quota::All)
                .with_members(["d", "e"])
                .with_days([1]),
            Cohort::new("weekend", Quota::Count(1))
                .with_members(["f"])
                .with_days([0, 6]),
            Cohort::new("empty", Quota::All).every_day(),
        ]
    }

    #[test]
    fn only_active_non_empty_cohorts_are_counted() {
        let fp = SettingsFingerprint::compute(monday(), &sample());
        let keys: Vec<&str> = fp.entries().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["family", "friends"]);
        assert_eq!(fp.entries()["family"], 2);
        assert_eq!(fp.canonical().unwrap(), r#"{"family":2,"friends":2}"#);
        assert_eq!(fp.to_string(), r#"{"family":2,"friends":2}"#);
    }

    #[test]
    fn canonical_form_matches_serde_json() {
        let fp = SettingsFingerprint::compute(monday(), &sample());
        assert_eq!(serde_json::to_string(&fp).unwrap(), fp.canonical().unwrap());
    }

    #[test]
    fn unrelated_changes_keep_fingerprint() {
        let base = SettingsFingerprint::compute(monday(), &sample());

        let mut renamed = sample();
        renamed[0].name = Some("Close friends".into());
        renamed[0].rotation_cursor = 2;
        renamed.reverse();
        assert_eq!(SettingsFingerprint::compute(monday(), &renamed), base);

        // Swapping members without changing the count keeps the fingerprint.
        let mut swapped = sample();
        swapped[0].member_ids = vec!["x".into(), "y".into(), "z".into()];
        assert_eq!(SettingsFingerprint::compute(monday(), &swapped), base);

        // Inactive cohorts can change freely.
        let mut weekend = sample();
        weekend[2].quota = Quota::All;
        assert_eq!(SettingsFingerprint::compute(monday(), &weekend), base);
    }

    #[test]
    fn quota_or_active_day_changes_alter_fingerprint() {
        let base = SettingsFingerprint::compute(monday(), &sample());

        let mut quota = sample();
        quota[0].quota = Quota::Count(1);
        assert_ne!(SettingsFingerprint::compute(monday(), &quota), base);

        let mut days = sample();
        days[1].active_days.remove(&1);
        assert_ne!(SettingsFingerprint::compute(monday(), &days), base);

        let mut activated = sample();
        activated[2].active_days.insert(1);
        assert_ne!(SettingsFingerprint::compute(monday(), &activated), base);
    }

    #[test]
    fn all_quota_tracks_member_count() {
        let base = SettingsFingerprint::compute(monday(), &sample());
        let mut grown = sample();
        grown[1].member_ids.push("g".into());
        assert_ne!(SettingsFingerprint::compute(monday(), &grown), base);
    }

    #[test]
    fn no_active_cohorts_gives_empty_fingerprint() {
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let cohorts = vec![Cohort::new("weekday", Quota::All)
            .with_members(["a"])
            .with_days([1, 2, 3, 4, 5])];
        let fp = SettingsFingerprint::compute(sunday, &cohorts);
        assert!(fp.is_empty());
        assert_eq!(fp.to_string(), "{}");
    }
}
