pub mod auth;
pub mod dashboard;
pub mod events;
pub mod extract;
pub mod session;
pub mod teams;

use crate::db::EventLog;
use crate::domain::context::WriteContext;
use crate::domain::models::Team;
use crate::state::{AppState, SharedState};
use axum::{routing::get, Router};
use serde::Serialize;
use uuid::Uuid;

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::router(state.clone()))
        .nest("/teams", teams::router(state.clone()))
        .nest("/events", events::router(state.clone()))
        .nest("/dashboard", dashboard::router(state))
}

/// A member as the dashboard lists them.
#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    pub user_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub is_creator: bool,
}

/// The caller's active team with a snapshot of its members and events.
pub(crate) struct TeamScope {
    pub team: Team,
    pub members: Vec<Uuid>,
    pub events: EventLog,
}

pub(crate) async fn team_scope(state: &AppState, user_id: Uuid) -> Option<TeamScope> {
    let (team, members) = {
        let teams = state.teams.read().await;
        let team = teams.active_team(user_id)?.clone();
        let members = teams.members(team.id);
        (team, members)
    };
    let events = state.store.read().await.team_events(team.id);
    Some(TeamScope {
        team,
        members,
        events,
    })
}

pub(crate) async fn write_context(state: &AppState, user_id: Uuid) -> WriteContext {
    let team_id = state.teams.read().await.active_team_id(user_id);
    WriteContext::new(Some(user_id), team_id)
}

pub(crate) async fn member_views(state: &AppState, team: &Team, members: &[Uuid]) -> Vec<MemberView> {
    let auth = state.auth.read().await;
    members
        .iter()
        .map(|id| {
            let user = auth.find_user(*id);
            MemberView {
                user_id: *id,
                name: user
                    .map(|u| u.name.clone())
                    .unwrap_or_else(|| fallback_name(*id)),
                avatar: user.and_then(|u| u.avatar.clone()),
                is_creator: team.created_by == *id,
            }
        })
        .collect()
}

fn fallback_name(user_id: Uuid) -> String {
    let short: String = user_id.simple().to_string().chars().take(4).collect();
    format!("User {short}")
}
