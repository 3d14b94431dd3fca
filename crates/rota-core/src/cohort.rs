//! Cohort configuration as the scheduler sees it.
//!
//! Cohorts are created and edited elsewhere; the scheduler reads them through
//! [`CohortReader`] and only ever writes back `rotation_cursor`.

use crate::config::ConfigWarning;
use crate::error::Result;
use crate::types::{weekday_index, CohortId, Quota, SubjectId, WeekdayIndex, SATURDAY};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Cohort
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
    pub id: CohortId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Rotation order. Never resorted.
    #[serde(default)]
    pub member_ids: Vec<SubjectId>,
    #[serde(default)]
    pub active_days: BTreeSet<WeekdayIndex>,
    pub quota: Quota,
    /// Where the next selection round starts. Kept in `0..member_ids.len()`
    /// by the scheduler; a stale larger value is wrapped on read.
    #[serde(default)]
    pub rotation_cursor: usize,
}

impl Cohort {
    pub fn new(id: impl Into<CohortId>, quota: Quota) -> Self {
        Self {
            id: id.into(),
            name: None,
            member_ids: Vec::new(),
            active_days: BTreeSet::new(),
            quota,
            rotation_cursor: 0,
        }
    }

    pub fn with_members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SubjectId>,
    {
        self.member_ids = members.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_days(mut self, days: impl IntoIterator<Item = WeekdayIndex>) -> Self {
        self.active_days = days.into_iter().collect();
        self
    }

    pub fn every_day(self) -> Self {
        self.with_days(0..=SATURDAY)
    }

    pub fn with_cursor(mut self, cursor: usize) -> Self {
        self.rotation_cursor = cursor;
        self
    }

    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.active_days.contains(&weekday_index(date))
    }

    pub fn effective_quota(&self) -> usize {
        self.quota.effective(self.member_ids.len())
    }
}

// ---------------------------------------------------------------------------
// Subject
// ---------------------------------------------------------------------------

/// A scheduled individual and the cohort it currently belongs to, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cohort_id: Option<CohortId>,
}

impl Subject {
    /// Derive the subject list from cohort membership, in cohort order.
    ///
    /// A subject listed by two cohorts appears twice; `validate_cohorts`
    /// reports that case.
    pub fn from_cohorts(cohorts: &[Cohort]) -> Vec<Subject> {
        cohorts
            .iter()
            .flat_map(|c| {
                c.member_ids.iter().map(move |m| Subject {
                    id: m.clone(),
                    cohort_id: Some(c.id.clone()),
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// CohortReader
// ---------------------------------------------------------------------------

/// Source of the current cohort configuration for an owner.
///
/// Implementations must return live values (member order, active days,
/// quota and cursor) on every call; the scheduler never caches them.
pub trait CohortReader {
    fn list_cohorts(&self, owner: &str) -> Result<Vec<Cohort>>;
}

impl<T: CohortReader + ?Sized> CohortReader for &T {
    fn list_cohorts(&self, owner: &str) -> Result<Vec<Cohort>> {
        (**self).list_cohorts(owner)
    }
}

impl<T: CohortReader + ?Sized> CohortReader for Arc<T> {
    fn list_cohorts(&self, owner: &str) -> Result<Vec<Cohort>> {
        (**self).list_cohorts(owner)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Report configuration that the scheduler tolerates but probably isn't
/// what the owner meant.
pub fn validate_cohorts(cohorts: &[Cohort]) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();
    let mut seen_ids: HashSet<&str> = HashSet::new();

    for cohort in cohorts {
        if crate::paths::validate_id(&cohort.id).is_err() {
            warnings.push(ConfigWarning::error(format!(
                "cohort id '{}' is not a valid id",
                cohort.id
            )));
        }
        if !seen_ids.insert(&cohort.id) {
            warnings.push(ConfigWarning::error(format!(
                "cohort '{}' is defined more than once",
                cohort.id
            )));
        }
        if cohort.quota == Quota::Count(0) {
            warnings.push(ConfigWarning::warning(format!(
                "cohort '{}' has quota 0 and will never select anyone",
                cohort.id
            )));
        }
        if cohort.active_days.is_empty() {
            warnings.push(ConfigWarning::warning(format!(
                "cohort '{}' has no active days",
                cohort.id
            )));
        }
        if let Some(day) = cohort.active_days.iter().find(|d| **d > SATURDAY) {
            warnings.push(ConfigWarning::error(format!(
                "cohort '{}' has weekday index {day}; expected 0 (Sunday) to 6 (Saturday)",
                cohort.id
            )));
        }
        let len = cohort.member_ids.len();
        if cohort.rotation_cursor != 0 && cohort.rotation_cursor >= len {
            warnings.push(ConfigWarning::warning(format!(
                "cohort '{}' has rotation cursor {} but only {len} member(s)",
                cohort.id, cohort.rotation_cursor
            )));
        }
        if cohort.member_ids.iter().any(|m| m.is_empty()) {
            warnings.push(ConfigWarning::error(format!(
                "cohort '{}' has an empty member id",
                cohort.id
            )));
        }

        let mut members: HashSet<&str> = HashSet::new();
        for m in &cohort.member_ids {
            if !members.insert(m) {
                warnings.push(ConfigWarning::warning(format!(
                    "cohort '{}' lists member '{m}' more than once",
                    cohort.id
                )));
            }
        }
    }

    let mut memberships: BTreeMap<SubjectId, Vec<CohortId>> = BTreeMap::new();
    for subject in Subject::from_cohorts(cohorts) {
        if let Some(cohort_id) = subject.cohort_id {
            let entry = memberships.entry(subject.id).or_default();
            if !entry.contains(&cohort_id) {
                entry.push(cohort_id);
            }
        }
    }
    for (subject, in_cohorts) in memberships {
        if in_cohorts.len() > 1 {
            warnings.push(ConfigWarning::warning(format!(
                "subject '{subject}' belongs to several cohorts: {}",
                in_cohorts.join(", ")
            )));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WarnLevel;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn active_day_uses_sunday_based_index() {
        let weekends = Cohort::new("weekend", Quota::All).with_days([0, 6]);
        assert!(weekends.is_active_on(date(2026, 10, 18)));
        assert!(weekends.is_active_on(date(2026, 10, 24)));
        assert!(!weekends.is_active_on(date(2026, 10, 19)));
    }

    #[test]
    fn yaml_cohort_defaults_cursor_and_keeps_member_order() {
        let yaml = "id: family\nmember_ids: [zoe, adam, mia]\nactive_days: [1, 3]\nquota: 2\n";
        let cohort: Cohort = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cohort.rotation_cursor, 0);
        assert_eq!(cohort.member_ids, vec!["zoe", "adam", "mia"]);
        assert_eq!(cohort.quota, Quota::Count(2));
    }

    #[test]
    fn subjects_carry_their_cohort() {
        let cohorts = vec![
            Cohort::new("a", Quota::All).with_members(["x", "y"]),
            Cohort::new("b", Quota::All).with_members(["z"]),
        ];
        let subjects = Subject::from_cohorts(&cohorts);
        assert_eq!(subjects.len(), 3);
        assert_eq!(subjects[2].cohort_id.as_deref(), Some("b"));
    }

    #[test]
    fn healthy_cohorts_produce_no_warnings() {
        let cohorts = vec![
            Cohort::new("friends", Quota::Count(2))
                .with_members(["a", "b", "c"])
                .every_day(),
            Cohort::new("family", Quota::All)
                .with_members(["d"])
                .with_days([0]),
        ];
        assert!(validate_cohorts(&cohorts).is_empty());
    }

    #[test]
    fn validation_reports_each_problem() {
        let cohorts = vec![
            Cohort::new("zero", Quota::Count(0))
                .with_members(["a", "a"])
                .with_days([9]),
            Cohort::new("idle", Quota::All).with_members(["a"]),
        ];
        let warnings = validate_cohorts(&cohorts);
        let text: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();

        assert!(text.iter().any(|m| m.contains("quota 0")));
        assert!(text.iter().any(|m| m.contains("weekday index 9")));
        assert!(text.iter().any(|m| m.contains("more than once")));
        assert!(text.iter().any(|m| m.contains("no active days")));
        assert!(text.iter().any(|m| m.contains("several cohorts")));
        assert!(warnings.iter().any(|w| w.level == WarnLevel::Error));
    }

    #[test]
    fn cursor_past_membership_is_reported() {
        let cohorts = vec![
            Cohort::new("far", Quota::Count(1))
                .with_members(["a", "b", "c"])
                .every_day()
                .with_cursor(99),
            Cohort::new("edge", Quota::Count(1))
                .with_members(["a"])
                .every_day()
                .with_cursor(1),
            Cohort::new("fresh", Quota::All).every_day(),
        ];
        let warnings = validate_cohorts(&cohorts);
        let cursor_msgs: Vec<&str> = warnings
            .iter()
            .map(|w| w.message.as_str())
            .filter(|m| m.contains("rotation cursor"))
            .collect();

        assert_eq!(cursor_msgs.len(), 2);
        assert!(cursor_msgs[0].contains("'far' has rotation cursor 99 but only 3 member(s)"));
        assert!(cursor_msgs[1].contains("'edge'"));
        assert!(warnings.iter().all(|w| w.level == WarnLevel::Warning));
    }
}
