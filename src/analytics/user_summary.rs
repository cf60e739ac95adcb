use super::{window_total, ActivityCounts, TrailingWindow};
use crate::domain::models::Activity;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Activity volume that maps to 100% participation.
pub const MAX_SCORE: f64 = 100.0;

/// Relative change between windows that still counts as stable.
const TREND_TOLERANCE: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: Uuid,
    pub activity_counts: ActivityCounts,
    pub participation: u8,
    pub trend: Trend,
}

impl UserSummary {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            activity_counts: ActivityCounts::default(),
            participation: 0,
            trend: Trend::Stable,
        }
    }

    pub fn total(&self) -> u64 {
        self.activity_counts.total
    }
}

pub fn participation(total: u64) -> u8 {
    let score = (total as f64 / MAX_SCORE * 100.0).round();
    score.min(100.0) as u8
}

/// Window-over-window comparison. No current activity is always stable.
pub fn classify_trend(current: u64, previous: u64) -> Trend {
    if current == 0 {
        return Trend::Stable;
    }
    if previous == 0 {
        return Trend::Up;
    }
    let (current, previous) = (current as f64, previous as f64);
    if current > previous * (1.0 + TREND_TOLERANCE) {
        Trend::Up
    } else if current < previous * (1.0 - TREND_TOLERANCE) {
        Trend::Down
    } else {
        Trend::Stable
    }
}

pub fn summarize_user(user_id: Uuid, activities: &[Activity], window: &TrailingWindow) -> UserSummary {
    let mut counts = ActivityCounts::default();
    for activity in activities
        .iter()
        .filter(|a| a.user_id == user_id && window.contains(a.timestamp))
    {
        counts.record(activity);
    }

    if counts.total == 0 {
        return UserSummary::empty(user_id);
    }

    let previous = window_total(
        activities.iter().filter(|a| a.user_id == user_id),
        &window.previous(),
    );

    UserSummary {
        user_id,
        activity_counts: counts,
        participation: participation(counts.total),
        trend: classify_trend(counts.total, previous),
    }
}
