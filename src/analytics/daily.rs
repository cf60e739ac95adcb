use super::{ActivityCounts, TrailingWindow};
use crate::domain::models::Activity;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub counts: ActivityCounts,
}

impl DailySummary {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            counts: ActivityCounts::default(),
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.total
    }
}

/// One bucket per calendar day of `window`, oldest first. Days without
/// activity are present with zero counts so chart axes stay dense.
pub fn bucket_daily(activities: &[Activity], window: &TrailingWindow) -> Vec<DailySummary> {
    let mut buckets: Vec<DailySummary> = window.dates().map(DailySummary::empty).collect();
    if buckets.is_empty() {
        return buckets;
    }

    for activity in activities {
        if let Some(index) = window.day_index(activity.timestamp) {
            buckets[index].counts.record(activity);
        }
    }

    buckets
}
