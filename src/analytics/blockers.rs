use crate::domain::models::Blocker;
use serde::{Deserialize, Serialize};

/// Open blockers at or above this count raise the alert banner.
pub const ALERT_THRESHOLD: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockerAlert {
    pub alert: bool,
    pub active_count: usize,
    pub recent: Vec<Blocker>,
}

/// Unresolved blockers, newest first, trimmed to `limit` for display.
pub fn blocker_alert(blockers: &[Blocker], limit: usize) -> BlockerAlert {
    let mut active: Vec<&Blocker> = blockers.iter().filter(|b| !b.resolved).collect();
    active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

    BlockerAlert {
        alert: active.len() >= ALERT_THRESHOLD,
        active_count: active.len(),
        recent: active.into_iter().take(limit).cloned().collect(),
    }
}
