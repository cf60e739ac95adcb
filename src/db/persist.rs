use super::EventLog;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Durable home of the three event collections. Loaded once at start,
/// saved after every mutation.
pub trait EventPersistence: Send + Sync {
    fn load(&self) -> Result<EventLog>;
    fn save(&self, log: &EventLog) -> Result<()>;
}

/// Single JSON document on disk. A missing file is an empty log.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EventPersistence for JsonFilePersistence {
    fn load(&self) -> Result<EventLog> {
        if !self.path.exists() {
            tracing::info!("No event store at {}, starting empty", self.path.display());
            return Ok(EventLog::default());
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading event store {}", self.path.display()))?;
        let log: EventLog = serde_json::from_str(&raw)
            .with_context(|| format!("parsing event store {}", self.path.display()))?;

        tracing::info!(
            "Loaded {} activities, {} blockers, {} moods from {}",
            log.activities.len(),
            log.blockers.len(),
            log.moods.len(),
            self.path.display()
        );
        Ok(log)
    }

    fn save(&self, log: &EventLog) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        // Write-then-rename: the previous snapshot stays whole until replaced.
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec(log)?;
        fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;

        tracing::debug!("Saved event store to {}", self.path.display());
        Ok(())
    }
}

/// Orders saves by generation: a snapshot older than the last one written is dropped.
pub struct SnapshotWriter {
    backend: Box<dyn EventPersistence>,
    written: Mutex<u64>,
}

impl SnapshotWriter {
    pub fn new(backend: Box<dyn EventPersistence>) -> Self {
        Self {
            backend,
            written: Mutex::new(0),
        }
    }

    pub fn load(&self) -> Result<EventLog> {
        self.backend.load()
    }

    /// Blocking; returns whether `log` reached the backend.
    pub fn write(&self, generation: u64, log: &EventLog) -> bool {
        let mut written = self.written.lock().unwrap_or_else(PoisonError::into_inner);
        if generation <= *written {
            tracing::debug!("Skipping stale snapshot {} (have {})", generation, *written);
            return false;
        }
        match self.backend.save(log) {
            Ok(()) => {
                *written = generation;
                true
            }
            Err(e) => {
                tracing::error!("Failed to save event store: {:#}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Activity, ActivityKind};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilePersistence::new(dir.path().join("none.json"));
        assert_eq!(store.load().unwrap(), EventLog::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/events.json");
        let store = JsonFilePersistence::new(&path);

        let mut log = EventLog::default();
        log.activities.push(Activity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            kind: ActivityKind::Review,
            value: 2,
            timestamp: Utc::now(),
            details: Some("Reviewed 2 PRs".to_string()),
        });

        store.save(&log).unwrap();
        assert_eq!(store.load().unwrap(), log);
        assert!(!path.with_extension("json.tmp").exists());
        assert!(!fs::read_to_string(&path).unwrap().contains('\n'));
    }

    #[test]
    fn test_stale_snapshot_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        let writer = SnapshotWriter::new(Box::new(JsonFilePersistence::new(&path)));

        let mut newer = EventLog::default();
        newer.moods.push(crate::domain::models::MoodEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            mood: crate::domain::models::Mood::Good,
            note: None,
            timestamp: Utc::now(),
        });

        assert!(writer.write(2, &newer));
        assert!(!writer.write(1, &EventLog::default()));
        assert_eq!(writer.load().unwrap(), newer);
    }

    #[test]
    fn test_corrupt_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        fs::write(&path, "{not json").unwrap();
        let err = JsonFilePersistence::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("parsing event store"));
    }
}
