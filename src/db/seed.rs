//! Demo data for a freshly created team. Seeded so the same inputs always
//! produce the same events.

use super::EventLog;
use crate::domain::models::{Activity, ActivityKind, Blocker, Mood, MoodEntry};
use crate::time_utils::Timezone;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use uuid::Uuid;

pub const DEMO_HISTORY_DAYS: i64 = 14;

const BLOCKER_TAGS: [&str; 6] = ["API", "Frontend", "Backend", "DevOps", "Design", "Documentation"];
const BLOCKER_DESCRIPTIONS: [&str; 4] = [
    "Unable to access API",
    "Build fails",
    "Test not passing",
    "Deployment issue",
];
const MOOD_WEIGHTS: [(Mood, u32); 5] = [
    (Mood::Great, 5),
    (Mood::Good, 10),
    (Mood::Neutral, 8),
    (Mood::Bad, 3),
    (Mood::Awful, 1),
];

pub struct DemoSeed {
    pub team_id: Uuid,
    pub members: Vec<Uuid>,
    pub today: NaiveDate,
    pub timezone: Timezone,
    pub now: DateTime<Utc>,
    pub seed: u64,
}

pub fn generate(plan: &DemoSeed) -> EventLog {
    let mut rng = StdRng::seed_from_u64(plan.seed);
    let mut log = EventLog::default();

    let mut members = plan.members.clone();
    members.sort();
    members.dedup();

    for member in &members {
        for offset in (0..=DEMO_HISTORY_DAYS).rev() {
            let date = plan.today - Duration::days(offset);
            generate_day(&mut rng, plan, *member, date, &mut log);
        }
    }

    tracing::info!(
        "Generated demo data for team {}: {} activities, {} blockers, {} moods",
        plan.team_id,
        log.activities.len(),
        log.blockers.len(),
        log.moods.len()
    );
    log
}

fn generate_day(rng: &mut StdRng, plan: &DemoSeed, user_id: Uuid, date: NaiveDate, log: &mut EventLog) {
    let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
    if weekend && rng.gen_bool(0.7) {
        return;
    }

    let count = rng.gen_range(0..if weekend { 5 } else { 10 });
    for _ in 0..count {
        let kind = ActivityKind::ALL[rng.gen_range(0..ActivityKind::ALL.len())];
        let time = NaiveTime::from_hms_opt(rng.gen_range(9..17), rng.gen_range(0..60), 0)
            .unwrap_or(NaiveTime::MIN);
        let timestamp = plan.timezone.at_local(date, time);

        let (value, details) = match kind {
            ActivityKind::Code => {
                let v = rng.gen_range(1..=5);
                (v, format!("Added {v} commit{}", plural(v)))
            }
            ActivityKind::Chat => {
                let v = rng.gen_range(1..=10);
                (v, format!("Sent {v} message{}", plural(v)))
            }
            ActivityKind::Review => {
                let v = rng.gen_range(1..=3);
                (v, format!("Reviewed {v} PR{}", plural(v)))
            }
            ActivityKind::Blocker => {
                if rng.gen_bool(0.3) {
                    log.blockers.push(demo_blocker(rng, plan, user_id, timestamp));
                }
                (1, "Reported a blocker".to_string())
            }
        };

        log.activities.push(Activity {
            id: next_id(rng),
            user_id,
            team_id: plan.team_id,
            kind,
            value,
            timestamp,
            details: Some(details),
        });
    }

    if rng.gen_bool(0.6) {
        let mood = weighted_mood(rng);
        let time = NaiveTime::from_hms_opt(17, rng.gen_range(0..60), 0).unwrap_or(NaiveTime::MIN);
        let note = rng
            .gen_bool(0.3)
            .then(|| format!("Demo mood entry for {}", mood.as_str()));
        log.moods.push(MoodEntry {
            id: next_id(rng),
            user_id,
            team_id: plan.team_id,
            mood,
            note,
            timestamp: plan.timezone.at_local(date, time),
        });
    }
}

fn demo_blocker(rng: &mut StdRng, plan: &DemoSeed, user_id: Uuid, created_at: DateTime<Utc>) -> Blocker {
    let tag_count = rng.gen_range(1..=3);
    let tags: BTreeSet<String> = (0..tag_count)
        .map(|_| BLOCKER_TAGS[rng.gen_range(0..BLOCKER_TAGS.len())].to_string())
        .collect();
    let description = format!(
        "Demo blocker: {}",
        BLOCKER_DESCRIPTIONS[rng.gen_range(0..BLOCKER_DESCRIPTIONS.len())]
    );

    let resolved = rng.gen_bool(0.6);
    let resolved_at = resolved.then(|| {
        let candidate = created_at + Duration::hours(rng.gen_range(0..48));
        candidate.min(plan.now).max(created_at)
    });

    Blocker {
        id: next_id(rng),
        user_id,
        team_id: plan.team_id,
        description,
        tags,
        resolved,
        created_at,
        resolved_at,
    }
}

fn weighted_mood(rng: &mut StdRng) -> Mood {
    let total: u32 = MOOD_WEIGHTS.iter().map(|(_, w)| w).sum();
    let mut roll = rng.gen_range(0..total);
    for (mood, weight) in MOOD_WEIGHTS {
        if roll < weight {
            return mood;
        }
        roll -= weight;
    }
    Mood::Neutral
}

fn next_id(rng: &mut StdRng) -> Uuid {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid()
}

fn plural(v: u32) -> &'static str {
    if v > 1 {
        "s"
    } else {
        ""
    }
}
