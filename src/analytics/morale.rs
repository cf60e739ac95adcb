use super::TrailingWindow;
use crate::domain::models::MoodEntry;

/// Reported when there is nothing to average.
pub const NEUTRAL_MORALE: f64 = 3.0;

/// Mean mood score (GREAT=5 .. AWFUL=1) of entries inside `window`.
pub fn estimate_morale(moods: &[MoodEntry], window: &TrailingWindow) -> f64 {
    let (sum, count) = moods
        .iter()
        .filter(|m| window.contains(m.timestamp))
        .fold((0u64, 0u64), |(sum, count), m| {
            (sum + u64::from(m.mood.score()), count + 1)
        });

    if count == 0 {
        return NEUTRAL_MORALE;
    }
    sum as f64 / count as f64
}
