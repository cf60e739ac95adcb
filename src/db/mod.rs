pub mod persist;
pub mod seed;

use crate::domain::context::WriteContext;
use crate::domain::models::{Activity, ActivityKind, Blocker, Mood, MoodEntry};
use crate::error::AppError;
use chrono::Utc;
use persist::{EventPersistence, SnapshotWriter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

const BLOCKER_SUMMARY_CHARS: usize = 30;
const MAX_TEXT_LEN: usize = 3000;

/// The three append-only collections, exactly as persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub blockers: Vec<Blocker>,
    #[serde(default)]
    pub moods: Vec<MoodEntry>,
}

impl EventLog {
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty() && self.blockers.is_empty() && self.moods.is_empty()
    }
}

pub struct EventStore {
    log: EventLog,
    persistence: Option<Arc<SnapshotWriter>>,
    generation: u64,
}

impl EventStore {
    /// In-memory only; nothing survives the process.
    pub fn new() -> Self {
        Self {
            log: EventLog::default(),
            persistence: None,
            generation: 0,
        }
    }

    pub fn open(persistence: Box<dyn EventPersistence>) -> anyhow::Result<Self> {
        let writer = SnapshotWriter::new(persistence);
        let log = writer.load()?;
        Ok(Self {
            log,
            persistence: Some(Arc::new(writer)),
            generation: 0,
        })
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Everything belonging to `team_id`. Aggregation only ever sees this.
    pub fn team_events(&self, team_id: Uuid) -> EventLog {
        EventLog {
            activities: self
                .log
                .activities
                .iter()
                .filter(|a| a.team_id == team_id)
                .cloned()
                .collect(),
            blockers: self
                .log
                .blockers
                .iter()
                .filter(|b| b.team_id == team_id)
                .cloned()
                .collect(),
            moods: self
                .log
                .moods
                .iter()
                .filter(|m| m.team_id == team_id)
                .cloned()
                .collect(),
        }
    }

    pub fn log_activity(
        &mut self,
        ctx: &WriteContext,
        kind: ActivityKind,
        value: i64,
        details: Option<String>,
    ) -> Result<Activity, AppError> {
        let actor = ctx.require()?;
        let value = u32::try_from(value)
            .ok()
            .filter(|v| *v >= 1)
            .ok_or_else(|| AppError::Validation("activity value must be a positive integer".into()))?;
        let details = clean_optional_text(details, "details")?;

        let activity = Activity {
            id: Uuid::new_v4(),
            user_id: actor.user_id,
            team_id: actor.team_id,
            kind,
            value,
            timestamp: Utc::now(),
            details,
        };
        self.log.activities.push(activity.clone());
        tracing::info!(
            "Logged {} activity (value {}) for user {} in team {}",
            kind.as_str(),
            value,
            actor.user_id,
            actor.team_id
        );
        self.persist();
        Ok(activity)
    }

    /// Appends the blocker and the BLOCKER activity that reports it.
    pub fn log_blocker(
        &mut self,
        ctx: &WriteContext,
        description: &str,
        tags: Vec<String>,
    ) -> Result<(Blocker, Activity), AppError> {
        let actor = ctx.require()?;
        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::Validation("blocker description must not be empty".into()));
        }
        if description.len() > MAX_TEXT_LEN {
            return Err(AppError::Validation("blocker description is too long".into()));
        }

        let tags: BTreeSet<String> = tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let now = Utc::now();
        let blocker = Blocker {
            id: Uuid::new_v4(),
            user_id: actor.user_id,
            team_id: actor.team_id,
            description: description.to_string(),
            tags,
            resolved: false,
            created_at: now,
            resolved_at: None,
        };
        let activity = Activity {
            id: Uuid::new_v4(),
            user_id: actor.user_id,
            team_id: actor.team_id,
            kind: ActivityKind::Blocker,
            value: 1,
            timestamp: now,
            details: Some(blocker_details(description)),
        };

        self.log.blockers.push(blocker.clone());
        self.log.activities.push(activity.clone());
        tracing::info!("Blocker {} reported by user {} in team {}", blocker.id, actor.user_id, actor.team_id);
        self.persist();
        Ok((blocker, activity))
    }

    pub fn log_mood(
        &mut self,
        ctx: &WriteContext,
        mood: Mood,
        note: Option<String>,
    ) -> Result<MoodEntry, AppError> {
        let actor = ctx.require()?;
        let note = clean_optional_text(note, "note")?;

        let entry = MoodEntry {
            id: Uuid::new_v4(),
            user_id: actor.user_id,
            team_id: actor.team_id,
            mood,
            note,
            timestamp: Utc::now(),
        };
        self.log.moods.push(entry.clone());
        tracing::info!("Logged mood {} for user {} in team {}", mood.as_str(), actor.user_id, actor.team_id);
        self.persist();
        Ok(entry)
    }

    /// Resolving twice leaves the first resolution untouched.
    pub fn resolve_blocker(&mut self, ctx: &WriteContext, blocker_id: Uuid) -> Result<Blocker, AppError> {
        let actor = ctx.require()?;
        let blocker = self
            .log
            .blockers
            .iter_mut()
            .find(|b| b.id == blocker_id && b.team_id == actor.team_id)
            .ok_or(AppError::NotFound("blocker"))?;

        let changed = blocker.resolve(Utc::now());
        let resolved = blocker.clone();
        if changed {
            tracing::info!("Blocker {} resolved by user {}", blocker_id, actor.user_id);
            self.persist();
        } else {
            tracing::debug!("Blocker {} was already resolved", blocker_id);
        }
        Ok(resolved)
    }

    /// Bulk append from the demo generator.
    pub fn append(&mut self, generated: EventLog) {
        if generated.is_empty() {
            return;
        }
        self.log.activities.extend(generated.activities);
        self.log.blockers.extend(generated.blockers);
        self.log.moods.extend(generated.moods);
        self.persist();
    }

    /// Snapshots the log and saves it on the blocking pool when a runtime is
    /// available, inline otherwise.
    fn persist(&mut self) {
        let Some(writer) = &self.persistence else {
            return;
        };
        let writer = Arc::clone(writer);
        self.generation += 1;
        let generation = self.generation;
        let snapshot = self.log.clone();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || writer.write(generation, &snapshot));
            }
            Err(_) => {
                writer.write(generation, &snapshot);
            }
        }
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

fn blocker_details(description: &str) -> String {
    let mut summary: String = description.chars().take(BLOCKER_SUMMARY_CHARS).collect();
    if description.chars().count() > BLOCKER_SUMMARY_CHARS {
        summary.push_str("...");
    }
    format!("Reported blocker: {summary}")
}

fn clean_optional_text(raw: Option<String>, field: &str) -> Result<Option<String>, AppError> {
    let Some(text) = raw else {
        return Ok(None);
    };
    let trimmed = text.trim();
    if trimmed.len() > MAX_TEXT_LEN {
        return Err(AppError::Validation(format!("{field} is too long")));
    }
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::persist::JsonFilePersistence;
    use super::*;
    use std::sync::Mutex;

    fn ctx() -> WriteContext {
        WriteContext::new(Some(Uuid::new_v4()), Some(Uuid::new_v4()))
    }

    #[test]
    fn test_writes_require_context() {
        let mut store = EventStore::new();
        let anonymous = WriteContext::default();
        let teamless = WriteContext::new(Some(Uuid::new_v4()), None);

        let err = store.log_activity(&anonymous, ActivityKind::Code, 1, None).unwrap_err();
        assert!(matches!(err, AppError::Precondition("not authenticated")));

        let err = store.log_mood(&teamless, Mood::Good, None).unwrap_err();
        assert!(matches!(err, AppError::Precondition("not in a team")));

        let err = store.log_blocker(&teamless, "stuck", vec![]).unwrap_err();
        assert!(matches!(err, AppError::Precondition(_)));

        assert!(store.log().is_empty());
    }

    #[test]
    fn test_activity_value_validation() {
        let mut store = EventStore::new();
        let c = ctx();
        assert!(matches!(
            store.log_activity(&c, ActivityKind::Chat, 0, None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            store.log_activity(&c, ActivityKind::Chat, -3, None),
            Err(AppError::Validation(_))
        ));

        let a = store
            .log_activity(&c, ActivityKind::Chat, 4, Some("  standup  ".into()))
            .unwrap();
        assert_eq!(a.value, 4);
        assert_eq!(a.details.as_deref(), Some("standup"));
        assert_eq!(Some(a.user_id), c.user_id);
        assert_eq!(store.log().activities.len(), 1);
    }

    #[test]
    fn test_log_blocker_appends_activity() {
        let mut store = EventStore::new();
        let c = ctx();
        let (blocker, activity) = store
            .log_blocker(
                &c,
                "Staging database is down and nobody has credentials",
                vec!["DevOps".into(), " devops ".into(), "DevOps".into(), "".into()],
            )
            .unwrap();

        assert!(!blocker.resolved);
        assert_eq!(blocker.tags.len(), 2);
        assert_eq!(activity.kind, ActivityKind::Blocker);
        assert_eq!(activity.value, 1);
        assert_eq!(
            activity.details.as_deref(),
            Some("Reported blocker: Staging database is down and n...")
        );
        assert_eq!(store.log().blockers.len(), 1);
        assert_eq!(store.log().activities.len(), 1);
    }

    #[test]
    fn test_blocker_short_description_not_truncated() {
        assert_eq!(blocker_details("CI red"), "Reported blocker: CI red");
    }

    #[test]
    fn test_empty_description_rejected() {
        let mut store = EventStore::new();
        let err = store.log_blocker(&ctx(), "   ", vec![]).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.log().is_empty());
    }

    #[test]
    fn test_resolve_blocker() {
        let mut store = EventStore::new();
        let c = ctx();
        let (blocker, _) = store.log_blocker(&c, "flaky tests", vec![]).unwrap();

        let first = store.resolve_blocker(&c, blocker.id).unwrap();
        assert!(first.resolved);
        assert!(first.resolved_at.unwrap() >= first.created_at);

        let second = store.resolve_blocker(&c, blocker.id).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_unknown_or_foreign_blocker() {
        let mut store = EventStore::new();
        let c = ctx();
        let (blocker, _) = store.log_blocker(&c, "flaky tests", vec![]).unwrap();

        assert!(matches!(
            store.resolve_blocker(&c, Uuid::new_v4()),
            Err(AppError::NotFound("blocker"))
        ));

        let outsider = WriteContext::new(c.user_id, Some(Uuid::new_v4()));
        assert!(matches!(
            store.resolve_blocker(&outsider, blocker.id),
            Err(AppError::NotFound(_))
        ));
        assert!(!store.log().blockers[0].resolved);
    }

    #[test]
    fn test_team_events_isolated() {
        let mut store = EventStore::new();
        let a = ctx();
        let b = ctx();
        store.log_activity(&a, ActivityKind::Code, 2, None).unwrap();
        store.log_activity(&b, ActivityKind::Code, 5, None).unwrap();
        store.log_mood(&b, Mood::Bad, None).unwrap();

        let events = store.team_events(a.team_id.unwrap());
        assert_eq!(events.activities.len(), 1);
        assert_eq!(events.activities[0].value, 2);
        assert!(events.moods.is_empty());
    }

    #[test]
    fn test_reload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        let c = ctx();

        {
            let mut store = EventStore::open(Box::new(JsonFilePersistence::new(&path))).unwrap();
            store.log_mood(&c, Mood::Great, Some("shipped".into())).unwrap();
            store.log_blocker(&c, "waiting on design", vec!["Design".into()]).unwrap();
        }

        let reopened = EventStore::open(Box::new(JsonFilePersistence::new(&path))).unwrap();
        assert_eq!(reopened.log().moods.len(), 1);
        assert_eq!(reopened.log().blockers.len(), 1);
        assert_eq!(reopened.log().activities.len(), 1);
    }

    struct RecordingPersistence(Arc<Mutex<Vec<usize>>>);

    impl EventPersistence for RecordingPersistence {
        fn load(&self) -> anyhow::Result<EventLog> {
            Ok(EventLog::default())
        }

        fn save(&self, log: &EventLog) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(log.activities.len());
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_saves_in_background_never_regress() {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let mut store = EventStore::open(Box::new(RecordingPersistence(saved.clone()))).unwrap();
        let c = ctx();
        for _ in 0..20 {
            store.log_activity(&c, ActivityKind::Code, 1, None).unwrap();
        }

        for _ in 0..200 {
            if saved.lock().unwrap().last() == Some(&20) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        let saved = saved.lock().unwrap().clone();
        assert_eq!(saved.last(), Some(&20));
        assert!(saved.windows(2).all(|w| w[0] < w[1]));
    }
}
