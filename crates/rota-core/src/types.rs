use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub type OwnerId = String;
pub type CohortId = String;
pub type SubjectId = String;

/// Weekday index used by `active_days`: 0 = Sunday through 6 = Saturday.
pub type WeekdayIndex = u8;

pub const SUNDAY: WeekdayIndex = 0;
pub const SATURDAY: WeekdayIndex = 6;

pub fn weekday_index(date: NaiveDate) -> WeekdayIndex {
    date.weekday().num_days_from_sunday() as WeekdayIndex
}

// ---------------------------------------------------------------------------
// Quota
// ---------------------------------------------------------------------------

/// How many members a cohort contributes per active day.
///
/// Serialized as a bare integer, or the string `"all"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quota {
    Count(u32),
    All,
}

impl Quota {
    /// Number of members selected from a cohort of `len` members.
    ///
    /// A zero count is accepted and selects nobody.
    pub fn effective(self, len: usize) -> usize {
        match self {
            Quota::All => len,
            Quota::Count(n) => (n as usize).min(len),
        }
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quota::Count(n) => write!(f, "{n}"),
            Quota::All => f.write_str("all"),
        }
    }
}

impl Serialize for Quota {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Quota::Count(n) => s.serialize_u32(*n),
            Quota::All => s.serialize_str("all"),
        }
    }
}

impl<'de> Deserialize<'de> for Quota {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Count(u32),
            Word(String),
        }

        match Repr::deserialize(d)? {
            Repr::Count(n) => Ok(Quota::Count(n)),
            Repr::Word(w) if w.eq_ignore_ascii_case("all") => Ok(Quota::All),
            Repr::Word(w) => Err(serde::de::Error::custom(format!(
                "invalid quota '{w}': expected a number or \"all\""
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_index_starts_on_sunday() {
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2026, 10, 24).unwrap();
        assert_eq!(weekday_index(sunday), SUNDAY);
        assert_eq!(weekday_index(monday), 1);
        assert_eq!(weekday_index(saturday), SATURDAY);
    }

    #[test]
    fn effective_quota_is_clamped_to_membership() {
        assert_eq!(Quota::Count(2).effective(5), 2);
        assert_eq!(Quota::Count(9).effective(3), 3);
        assert_eq!(Quota::Count(0).effective(3), 0);
        assert_eq!(Quota::All.effective(4), 4);
        assert_eq!(Quota::All.effective(0), 0);
    }

    #[test]
    fn quota_yaml_accepts_number_or_all() {
        let n: Quota = serde_yaml::from_str("3").unwrap();
        let all: Quota = serde_yaml::from_str("all").unwrap();
        let upper: Quota = serde_yaml::from_str("ALL").unwrap();
        assert_eq!(n, Quota::Count(3));
        assert_eq!(all, Quota::All);
        assert_eq!(upper, Quota::All);
        assert!(serde_yaml::from_str::<Quota>("some").is_err());
        assert_eq!(serde_json::to_string(&Quota::All).unwrap(), "\"all\"");
    }
}
