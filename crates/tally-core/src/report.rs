//! Time reports over calendar periods.
//!
//! A report covers the entries that started inside a period and totals
//! their active durations per project and per tag. An entry with several
//! tags counts toward each of them, so tag totals may exceed the overall
//! total.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::entry::Entry;
use crate::types::{ProjectName, TagName, ValidationError};

/// A calendar period relative to the current local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Today,
    Yesterday,
    Week,
    LastWeek,
    Month,
    LastMonth,
    Year,
    LastYear,
}

impl Period {
    /// Every period, in menu order.
    pub const ALL: [Self; 8] = [
        Self::Today,
        Self::Yesterday,
        Self::Week,
        Self::LastWeek,
        Self::Month,
        Self::LastMonth,
        Self::Year,
        Self::LastYear,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::Week => "week",
            Self::LastWeek => "lastWeek",
            Self::Month => "month",
            Self::LastMonth => "lastMonth",
            Self::Year => "year",
            Self::LastYear => "lastYear",
        }
    }

    /// Local days covered by the period as a half-open `[first, end)` range.
    ///
    /// Weeks start on Monday. The current week, month and year end after
    /// `today`.
    pub fn days(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let tomorrow = today + Duration::days(1);
        let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        let month_start = first_of_month(today);
        let year_start = today - Duration::days(i64::from(today.ordinal0()));
        match self {
            Self::Today => (today, tomorrow),
            Self::Yesterday => (today - Duration::days(1), today),
            Self::Week => (monday, tomorrow),
            Self::LastWeek => (monday - Duration::days(7), monday),
            Self::Month => (month_start, tomorrow),
            Self::LastMonth => (first_of_month(month_start - Duration::days(1)), month_start),
            Self::Year => (year_start, tomorrow),
            Self::LastYear => {
                let last_day = year_start - Duration::days(1);
                (last_day - Duration::days(i64::from(last_day.ordinal0())), year_start)
            }
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Period {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|period| period.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::InvalidPeriod {
                value: s.to_string(),
            })
    }
}

/// Active time totals of a set of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub total: Duration,
    /// Sorted by project name.
    pub by_project: Vec<(ProjectName, Duration)>,
    /// Sorted by tag name.
    pub by_tag: Vec<(TagName, Duration)>,
}

/// Totals the active durations of `entries` as of `now`.
pub fn summarize(entries: &[Entry], now: DateTime<Utc>) -> Summary {
    let mut total = Duration::zero();
    let mut by_project: BTreeMap<&ProjectName, Duration> = BTreeMap::new();
    let mut by_tag: BTreeMap<&TagName, Duration> = BTreeMap::new();
    for entry in entries {
        let duration = entry.duration(now);
        total += duration;
        *by_project.entry(&entry.project).or_insert_with(Duration::zero) += duration;
        for tag in &entry.tags {
            *by_tag.entry(tag).or_insert_with(Duration::zero) += duration;
        }
    }
    Summary {
        total,
        by_project: by_project
            .into_iter()
            .map(|(name, duration)| (name.clone(), duration))
            .collect(),
        by_tag: by_tag
            .into_iter()
            .map(|(name, duration)| (name.clone(), duration))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    use crate::entry::Pause;
    use crate::types::{EntryId, EntryStatus, PauseId, PauseReason};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
    }

    fn stopped(id: &str, project: &str, tags: &[&str], from: u32, to: u32) -> Entry {
        Entry {
            id: EntryId::new(id).unwrap(),
            project: ProjectName::new(project).unwrap(),
            title: None,
            tags: tags.iter().map(|t| TagName::new(*t).unwrap()).collect(),
            start_time: at(from, 0),
            end_time: Some(at(to, 0)),
            status: EntryStatus::Stopped,
            pauses: Vec::new(),
        }
    }

    #[test]
    fn period_names_round_trip() {
        for period in Period::ALL {
            assert_eq!(period.as_str().parse::<Period>().unwrap(), period);
        }
        assert_eq!("LASTWEEK".parse::<Period>().unwrap(), Period::LastWeek);
        assert!(matches!(
            "fortnight".parse::<Period>(),
            Err(ValidationError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn days_for_a_wednesday() {
        let today = date(2026, 3, 4);
        let expected = [
            (Period::Today, date(2026, 3, 4), date(2026, 3, 5)),
            (Period::Yesterday, date(2026, 3, 3), date(2026, 3, 4)),
            (Period::Week, date(2026, 3, 2), date(2026, 3, 5)),
            (Period::LastWeek, date(2026, 2, 23), date(2026, 3, 2)),
            (Period::Month, date(2026, 3, 1), date(2026, 3, 5)),
            (Period::LastMonth, date(2026, 2, 1), date(2026, 3, 1)),
            (Period::Year, date(2026, 1, 1), date(2026, 3, 5)),
            (Period::LastYear, date(2025, 1, 1), date(2026, 1, 1)),
        ];
        for (period, first, end) in expected {
            assert_eq!(period.days(today), (first, end), "{period}");
        }
    }

    #[test]
    fn sunday_belongs_to_the_week_started_monday() {
        let (first, end) = Period::Week.days(date(2026, 3, 8));
        assert_eq!(first, date(2026, 3, 2));
        assert_eq!(end, date(2026, 3, 9));
    }

    #[test]
    fn last_month_in_january_is_december() {
        assert_eq!(
            Period::LastMonth.days(date(2026, 1, 15)),
            (date(2025, 12, 1), date(2026, 1, 1))
        );
    }

    #[test]
    fn summary_totals_by_project_and_tag() {
        let mut work = stopped("e1", "work", &["backend", "urgent"], 9, 11);
        work.pauses.push(Pause {
            id: PauseId::new("p1").unwrap(),
            entry_id: work.id.clone(),
            pause_time: at(10, 0),
            resume_time: Some(at(10, 30)),
            reason: PauseReason::Manual,
        });
        let home = stopped("e2", "home", &["backend"], 12, 13);
        let more_work = stopped("e3", "work", &[], 14, 15);

        let summary = summarize(&[work, home, more_work], at(18, 0));

        assert_eq!(summary.total, Duration::minutes(210));
        let projects: Vec<_> = summary
            .by_project
            .iter()
            .map(|(name, d)| (name.as_str(), d.num_minutes()))
            .collect();
        assert_eq!(projects, [("home", 60), ("work", 150)]);
        let tags: Vec<_> = summary
            .by_tag
            .iter()
            .map(|(name, d)| (name.as_str(), d.num_minutes()))
            .collect();
        assert_eq!(tags, [("backend", 150), ("urgent", 90)]);
    }

    #[test]
    fn running_entries_count_until_now() {
        let mut running = stopped("e1", "work", &[], 9, 9);
        running.end_time = None;
        running.status = EntryStatus::Running;
        let summary = summarize(&[running], at(9, 45));
        assert_eq!(summary.total, Duration::minutes(45));
        assert!(summary.by_tag.is_empty());
    }
}
