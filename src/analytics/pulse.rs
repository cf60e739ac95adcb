use super::daily::{bucket_daily, DailySummary};
use super::morale::estimate_morale;
use super::TrailingWindow;
use crate::domain::models::{Activity, MoodEntry};
use serde::{Deserialize, Serialize};

pub const PULSE_DAYS: i64 = 14;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseTrend {
    pub daily: Vec<DailySummary>,
    /// Mean mood per day aligned with `daily`; `None` on days without check-ins.
    pub daily_morale: Vec<Option<f64>>,
    pub average_daily_activity: f64,
    pub morale: f64,
}

/// Activity and morale series over `window`, plus the two headline numbers of
/// the team pulse chart. The headline morale uses `morale_window`, the same
/// window the morale card shows.
pub fn pulse_trend(
    activities: &[Activity],
    moods: &[MoodEntry],
    window: &TrailingWindow,
    morale_window: &TrailingWindow,
) -> PulseTrend {
    let daily = bucket_daily(activities, window);
    let average_daily_activity = if daily.is_empty() {
        0.0
    } else {
        daily.iter().map(DailySummary::total).sum::<u64>() as f64 / daily.len() as f64
    };

    PulseTrend {
        daily,
        daily_morale: daily_morale(moods, window),
        average_daily_activity,
        morale: estimate_morale(moods, morale_window),
    }
}

fn daily_morale(moods: &[MoodEntry], window: &TrailingWindow) -> Vec<Option<f64>> {
    let mut buckets = vec![(0u64, 0u64); window.days.max(0) as usize];
    for entry in moods {
        if let Some(index) = window.day_index(entry.timestamp) {
            let (sum, count) = &mut buckets[index];
            *sum += u64::from(entry.mood.score());
            *count += 1;
        }
    }
    buckets
        .into_iter()
        .map(|(sum, count)| (count > 0).then(|| sum as f64 / count as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::*;
    use crate::domain::models::{ActivityKind, Mood};
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    fn mood(mood: Mood, timestamp: DateTime<Utc>) -> MoodEntry {
        MoodEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            mood,
            note: None,
            timestamp,
        }
    }

    #[test]
    fn test_average_over_dense_days() {
        let user = Uuid::new_v4();
        let activities = vec![
            activity(user, user, ActivityKind::Code, 10, at(13, 10)),
            activity(user, user, ActivityKind::Chat, 18, at(7, 10)),
        ];
        let moods = vec![mood(Mood::Good, at(12, 17))];

        let pulse = pulse_trend(&activities, &moods, &window(13, PULSE_DAYS), &window(13, 7));
        assert_eq!(pulse.daily.len(), 14);
        assert_eq!(pulse.daily_morale.len(), 14);
        assert!((pulse.average_daily_activity - 2.0).abs() < f64::EPSILON);
        assert_eq!(pulse.morale, 4.0);
    }

    #[test]
    fn test_daily_morale_per_day() {
        let moods = vec![
            mood(Mood::Great, at(10, 9)),
            mood(Mood::Bad, at(10, 18)),
            mood(Mood::Awful, at(12, 17)),
            mood(Mood::Great, at(1, 17)),
        ];

        let pulse = pulse_trend(&[], &moods, &window(13, 4), &window(13, 4));
        // Days 10..=13, oldest first.
        assert_eq!(pulse.daily_morale, vec![Some(3.5), None, Some(1.0), None]);
        assert!((pulse.morale - 2.666_666_666_666_666_5).abs() < 1e-9);
    }

    #[test]
    fn test_headline_morale_uses_its_own_window() {
        let moods = vec![mood(Mood::Awful, at(2, 17)), mood(Mood::Great, at(12, 17))];

        let pulse = pulse_trend(&[], &moods, &window(13, PULSE_DAYS), &window(13, 7));
        assert_eq!(pulse.morale, 5.0);
        assert_eq!(pulse.daily_morale[2], Some(1.0));
        assert_eq!(pulse.daily_morale[12], Some(5.0));
    }

    #[test]
    fn test_empty_window() {
        let pulse = pulse_trend(&[], &[], &window(13, 0), &window(13, 0));
        assert!(pulse.daily.is_empty());
        assert!(pulse.daily_morale.is_empty());
        assert_eq!(pulse.average_daily_activity, 0.0);
        assert_eq!(pulse.morale, 3.0);
    }
}
