use super::TrailingWindow;
use crate::domain::models::Activity;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Daily total that saturates the colour scale.
pub const HEATMAP_SATURATION: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub count: u64,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapRow {
    pub user_id: Uuid,
    pub cells: Vec<HeatmapCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heatmap {
    pub days: Vec<NaiveDate>,
    pub rows: Vec<HeatmapRow>,
}

/// 0 for no activity, otherwise 1..=5 by share of the saturation count.
pub fn intensity_level(count: u64) -> u8 {
    if count == 0 {
        return 0;
    }
    let intensity = (count as f64 / HEATMAP_SATURATION as f64).min(1.0);
    match intensity {
        i if i < 0.2 => 1,
        i if i < 0.4 => 2,
        i if i < 0.6 => 3,
        i if i < 0.8 => 4,
        _ => 5,
    }
}

/// Member × day grid of activity totals. Rows follow sorted member id order.
pub fn member_heatmap(activities: &[Activity], member_ids: &[Uuid], window: &TrailingWindow) -> Heatmap {
    let days: Vec<NaiveDate> = window.dates().collect();

    let mut members = member_ids.to_vec();
    members.sort();
    members.dedup();

    let mut totals = vec![vec![0u64; days.len()]; members.len()];
    for activity in activities {
        let Ok(row) = members.binary_search(&activity.user_id) else {
            continue;
        };
        if let Some(col) = window.day_index(activity.timestamp) {
            totals[row][col] += u64::from(activity.value);
        }
    }

    let rows = members
        .into_iter()
        .zip(totals)
        .map(|(user_id, counts)| HeatmapRow {
            user_id,
            cells: counts
                .into_iter()
                .map(|count| HeatmapCell {
                    count,
                    level: intensity_level(count),
                })
                .collect(),
        })
        .collect();

    Heatmap { days, rows }
}
