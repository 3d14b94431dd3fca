//! Sequential round-robin selection over cohort members.
//!
//! `compute_rotation` is pure: the same date and cohorts always give the same
//! selection and cursor updates. The reconciler relies on that to decide
//! whether a stored daily list can be reused.

use crate::cohort::Cohort;
use crate::types::{CohortId, SubjectId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// CursorUpdate
// ---------------------------------------------------------------------------

/// A cursor move for one cohort. `from` is the cursor the move was derived
/// from, so a store can reject the move if another writer got there first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorUpdate {
    pub from: usize,
    pub to: usize,
}

pub type CursorUpdates = BTreeMap<CohortId, CursorUpdate>;

// ---------------------------------------------------------------------------
// Rotation
// ---------------------------------------------------------------------------

/// What one active cohort contributed to the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CohortSelection {
    pub cohort_id: CohortId,
    pub effective_quota: usize,
    /// Selected members in rotation order.
    pub selected: Vec<SubjectId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Rotation {
    pub selected_subject_ids: BTreeSet<SubjectId>,
    /// Only cohorts whose cursor actually moved.
    pub cursor_updates: CursorUpdates,
    pub cohorts: Vec<CohortSelection>,
}

/// Select the day's subjects and the cursor each cohort moves to.
///
/// Per cohort: skip if inactive on `date` or empty, take
/// `effective_quota` consecutive members starting at the cursor (wrapping),
/// and advance the cursor by the same amount modulo the member count.
pub fn compute_rotation(date: NaiveDate, cohorts: &[Cohort]) -> Rotation {
    let mut rotation = Rotation::default();

    for cohort in cohorts {
        if !cohort.is_active_on(date) {
            continue;
        }
        let len = cohort.member_ids.len();
        if len == 0 {
            continue;
        }

        let quota = cohort.effective_quota();
        let start = cohort.rotation_cursor % len;
        let selected: Vec<SubjectId> = (0..quota)
            .map(|i| cohort.member_ids[(start + i) % len].clone())
            .collect();

        if quota > 0 {
            let next = (start + quota) % len;
            if next != cohort.rotation_cursor {
                rotation.cursor_updates.insert(
                    cohort.id.clone(),
                    CursorUpdate {
                        from: cohort.rotation_cursor,
                        to: next,
                    },
                );
            }
        }

        rotation.selected_subject_ids.extend(selected.iter().cloned());
        rotation.cohorts.push(CohortSelection {
            cohort_id: cohort.id.clone(),
            effective_quota: quota,
            selected,
        });
    }

    rotation
}

impl Rotation {
    /// Apply the cursor updates to an in-memory copy of the cohorts.
    pub fn advance(&self, cohorts: &mut [Cohort]) {
        for cohort in cohorts {
            if let Some(update) = self.cursor_updates.get(&cohort.id) {
                cohort.rotation_cursor = update.to;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Quota;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn ids(xs: &[&str]) -> BTreeSet<SubjectId> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn round_robin_wraps_across_days() {
        let mut cohorts = vec![Cohort::new("friends", Quota::Count(2))
            .with_members(["A", "B", "C", "D", "E"])
            .every_day()];

        let day1 = compute_rotation(monday(), &cohorts);
        assert_eq!(day1.selected_subject_ids, ids(&["A", "B"]));
        assert_eq!(day1.cursor_updates["friends"], CursorUpdate { from: 0, to: 2 });
        day1.advance(&mut cohorts);

        let day2 = compute_rotation(monday().succ_opt().unwrap(), &cohorts);
        assert_eq!(day2.selected_subject_ids, ids(&["C", "D"]));
        assert_eq!(day2.cursor_updates["friends"].to, 4);
        day2.advance(&mut cohorts);

        let day3 = compute_rotation(monday() + chrono::Days::new(2), &cohorts);
        assert_eq!(day3.selected_subject_ids, ids(&["E", "A"]));
        assert_eq!(day3.cursor_updates["friends"].to, 1);
        assert_eq!(day3.cohorts[0].selected, vec!["E", "A"]);
    }

    #[test]
    fn all_quota_selects_everyone_and_keeps_cursor() {
        for cursor in 0..3 {
            let cohorts = vec![Cohort::new("family", Quota::All)
                .with_members(["x", "y", "z"])
                .every_day()
                .with_cursor(cursor)];
            let r = compute_rotation(monday(), &cohorts);
            assert_eq!(r.selected_subject_ids, ids(&["x", "y", "z"]));
            assert!(r.cursor_updates.is_empty(), "cursor {cursor} should not move");
        }
    }

    #[test]
    fn inactive_cohort_contributes_nothing() {
        let cohorts = vec![Cohort::new("weekend", Quota::Count(1))
            .with_members(["a", "b"])
            .with_days([0, 6])];
        let r = compute_rotation(monday(), &cohorts);
        assert!(r.selected_subject_ids.is_empty());
        assert!(r.cursor_updates.is_empty());
        assert!(r.cohorts.is_empty());
    }

    #[test]
    fn empty_cohort_is_skipped_even_when_active() {
        let cohorts = vec![
            Cohort::new("empty", Quota::All).every_day(),
            Cohort::new("empty-count", Quota::Count(3)).every_day(),
        ];
        let r = compute_rotation(monday(), &cohorts);
        assert_eq!(r, Rotation::default());
    }

    #[test]
    fn zero_quota_selects_nobody_without_moving_cursor() {
        let cohorts = vec![Cohort::new("zero", Quota::Count(0))
            .with_members(["a", "b"])
            .every_day()
            .with_cursor(1)];
        let r = compute_rotation(monday(), &cohorts);
        assert!(r.selected_subject_ids.is_empty());
        assert!(r.cursor_updates.is_empty());
        assert_eq!(r.cohorts[0].effective_quota, 0);
    }

    #[test]
    fn quota_larger_than_membership_takes_each_member_once() {
        let cohorts = vec![Cohort::new("small", Quota::Count(10))
            .with_members(["a", "b", "c"])
            .every_day()
            .with_cursor(1)];
        let r = compute_rotation(monday(), &cohorts);
        assert_eq!(r.cohorts[0].selected, vec!["b", "c", "a"]);
        assert!(r.cursor_updates.is_empty());
    }

    #[test]
    fn stale_cursor_past_shrunk_membership_wraps() {
        let cohorts = vec![Cohort::new("shrunk", Quota::Count(1))
            .with_members(["a", "b", "c"])
            .every_day()
            .with_cursor(7)];
        let r = compute_rotation(monday(), &cohorts);
        // 7 % 3 == 1
        assert_eq!(r.selected_subject_ids, ids(&["b"]));
        assert_eq!(r.cursor_updates["shrunk"], CursorUpdate { from: 7, to: 2 });
    }

    #[test]
    fn union_deduplicates_across_cohorts() {
        let cohorts = vec![
            Cohort::new("one", Quota::All).with_members(["a", "b"]).every_day(),
            Cohort::new("two", Quota::All).with_members(["b", "c"]).every_day(),
        ];
        let r = compute_rotation(monday(), &cohorts);
        assert_eq!(r.selected_subject_ids, ids(&["a", "b", "c"]));
        assert_eq!(r.cohorts.len(), 2);
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let cohorts = vec![
            Cohort::new("a", Quota::Count(2))
                .with_members(["p", "q", "r"])
                .every_day()
                .with_cursor(2),
            Cohort::new("b", Quota::Count(1)).with_members(["s"]).with_days([1]),
        ];
        assert_eq!(
            compute_rotation(monday(), &cohorts),
            compute_rotation(monday(), &cohorts)
        );
    }
}
