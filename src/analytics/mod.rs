//! Aggregation engine: pure reductions from team-scoped event slices to the
//! summaries the dashboard renders. Nothing in here touches shared state.

pub mod blockers;
pub mod daily;
pub mod heatmap;
pub mod morale;
pub mod pulse;
pub mod team_summary;
pub mod user_summary;

use crate::domain::models::{Activity, ActivityKind};
use crate::time_utils::Timezone;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The most recent `days` calendar days up to and including `reference`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailingWindow {
    pub reference: NaiveDate,
    pub days: i64,
    pub timezone: Timezone,
}

impl TrailingWindow {
    pub fn new(reference: NaiveDate, days: i64, timezone: Timezone) -> Self {
        Self {
            reference,
            days,
            timezone,
        }
    }

    /// Window ending today in `timezone`.
    pub fn ending_today(days: i64, timezone: Timezone) -> Self {
        Self::new(timezone.today(), days, timezone)
    }

    pub fn is_empty(&self) -> bool {
        self.days <= 0
    }

    pub fn start(&self) -> NaiveDate {
        self.reference - Duration::days(self.days.max(1) - 1)
    }

    /// Same length, ending the day before this window starts.
    pub fn previous(&self) -> Self {
        Self::new(
            self.reference - Duration::days(self.days.max(0)),
            self.days,
            self.timezone,
        )
    }

    /// Position of `timestamp`'s calendar day inside the window, oldest = 0.
    pub fn day_index(&self, timestamp: DateTime<Utc>) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let day = self.timezone.local_date(timestamp);
        let index = (day - self.start()).num_days();
        if (0..self.days).contains(&index) {
            Some(index as usize)
        } else {
            None
        }
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.day_index(timestamp).is_some()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start();
        (0..self.days.max(0)).map(move |offset| start + Duration::days(offset))
    }
}

/// Summed activity values per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCounts {
    pub code: u64,
    pub chat: u64,
    pub review: u64,
    pub blocker: u64,
    pub total: u64,
}

impl ActivityCounts {
    pub fn add(&mut self, kind: ActivityKind, value: u32) {
        let value = u64::from(value);
        match kind {
            ActivityKind::Code => self.code += value,
            ActivityKind::Chat => self.chat += value,
            ActivityKind::Review => self.review += value,
            ActivityKind::Blocker => self.blocker += value,
        }
        self.total += value;
    }

    pub fn record(&mut self, activity: &Activity) {
        self.add(activity.kind, activity.value);
    }
}

/// Sum of values of `activities` that fall inside `window`.
pub fn window_total<'a, I>(activities: I, window: &TrailingWindow) -> u64
where
    I: IntoIterator<Item = &'a Activity>,
{
    activities
        .into_iter()
        .filter(|a| window.contains(a.timestamp))
        .map(|a| u64::from(a.value))
        .sum()
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_window_bounds() {
        let w = window(10, 7);
        assert_eq!(w.start(), day(4));
        assert_eq!(w.dates().count(), 7);
        assert_eq!(w.dates().last(), Some(day(10)));

        let prev = w.previous();
        assert_eq!(prev.reference, day(3));
        assert_eq!(prev.start(), day(0) - Duration::days(3));
        assert_eq!(prev.days, 7);
    }

    #[test]
    fn test_day_index() {
        let w = window(10, 7);
        assert_eq!(w.day_index(at(4, 0)), Some(0));
        assert_eq!(w.day_index(at(10, 23)), Some(6));
        assert_eq!(w.day_index(at(3, 23)), None);
        assert_eq!(w.day_index(at(11, 0)), None);
    }

    #[test]
    fn test_empty_window_contains_nothing() {
        let w = window(10, 0);
        assert!(w.is_empty());
        assert_eq!(w.dates().count(), 0);
        assert!(!w.contains(at(10, 12)));
    }

    #[test]
    fn test_counts_add() {
        let mut counts = ActivityCounts::default();
        counts.add(ActivityKind::Code, 3);
        counts.add(ActivityKind::Chat, 2);
        counts.add(ActivityKind::Code, 1);
        assert_eq!(counts.code, 4);
        assert_eq!(counts.chat, 2);
        assert_eq!(counts.total, 6);
    }
}
