use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityKind {
    Code,
    Chat,
    Review,
    Blocker,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 4] = [
        ActivityKind::Code,
        ActivityKind::Chat,
        ActivityKind::Review,
        ActivityKind::Blocker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Code => "CODE",
            ActivityKind::Chat => "CHAT",
            ActivityKind::Review => "REVIEW",
            ActivityKind::Blocker => "BLOCKER",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Activity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub team_id: Uuid,
    pub kind: ActivityKind,
    pub value: u32,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Blocker {
    pub id: Uuid,
    pub user_id: Uuid,
    pub team_id: Uuid,
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Blocker {
    /// Unresolved → resolved, exactly once. `resolved_at` never precedes `created_at`.
    pub fn resolve(&mut self, now: DateTime<Utc>) -> bool {
        if self.resolved {
            return false;
        }
        self.resolved = true;
        self.resolved_at = Some(now.max(self.created_at));
        true
    }
}

/// Ordered best to worst.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mood {
    Great,
    Good,
    Neutral,
    Bad,
    Awful,
}

impl Mood {
    pub fn score(&self) -> u8 {
        match self {
            Mood::Great => 5,
            Mood::Good => 4,
            Mood::Neutral => 3,
            Mood::Bad => 2,
            Mood::Awful => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Great => "GREAT",
            Mood::Good => "GOOD",
            Mood::Neutral => "NEUTRAL",
            Mood::Bad => "BAD",
            Mood::Awful => "AWFUL",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub team_id: Uuid,
    pub mood: Mood,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub invite_code: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn blocker(created_at: DateTime<Utc>) -> Blocker {
        Blocker {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            description: "CI is red".to_string(),
            tags: BTreeSet::new(),
            resolved: false,
            created_at,
            resolved_at: None,
        }
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let created = Utc::now() - Duration::hours(3);
        let mut b = blocker(created);

        assert!(b.resolve(Utc::now()));
        let first = b.resolved_at;
        assert!(b.resolved);
        assert!(first.unwrap() >= created);

        assert!(!b.resolve(Utc::now() + Duration::hours(1)));
        assert_eq!(b.resolved_at, first);
    }

    #[test]
    fn test_resolve_clamps_to_created_at() {
        let created = Utc::now();
        let mut b = blocker(created);
        b.resolve(created - Duration::minutes(5));
        assert_eq!(b.resolved_at, Some(created));
    }

    #[test]
    fn test_mood_scores_and_order() {
        assert_eq!(Mood::Great.score(), 5);
        assert_eq!(Mood::Awful.score(), 1);
        assert!(Mood::Great < Mood::Awful);
        assert_eq!(serde_json::to_string(&Mood::Neutral).unwrap(), "\"NEUTRAL\"");
    }

    #[test]
    fn test_activity_kind_wire_names() {
        for kind in ActivityKind::ALL {
            assert_eq!(serde_json::to_string(&kind).unwrap(), format!("\"{}\"", kind.as_str()));
        }
        assert!(serde_json::from_str::<ActivityKind>("\"DEPLOY\"").is_err());
    }
}
