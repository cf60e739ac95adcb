use crate::domain::models::Team;
use crate::error::AppError;
use crate::state::SharedState;
use crate::web::{
    extract::{ApiJson, ApiPath},
    member_views,
    session::UserSession,
    MemberView,
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize)]
pub struct TeamNameRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct JoinTeamRequest {
    pub code: String,
}

#[derive(Serialize)]
pub struct TeamsResponse {
    pub teams: Vec<Team>,
    pub active_team_id: Option<Uuid>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_teams).post(create_team))
        .route("/join", post(join_team))
        .route("/leave", post(leave_team))
        .route("/:id/select", post(select_team))
        .route("/current", put(rename_team))
        .route("/current/members", get(list_members))
        .route("/current/members/:user_id", delete(remove_member))
        .with_state(state)
}

async fn list_teams(
    State(state): State<SharedState>,
    session: UserSession,
) -> Json<TeamsResponse> {
    let teams = state.teams.read().await;
    Json(TeamsResponse {
        teams: teams.teams_for(session.user_id),
        active_team_id: teams.active_team_id(session.user_id),
    })
}

async fn create_team(
    State(state): State<SharedState>,
    session: UserSession,
    ApiJson(payload): ApiJson<TeamNameRequest>,
) -> Result<(StatusCode, Json<Team>), AppError> {
    let team = state
        .teams
        .write()
        .await
        .create_team(session.user_id, &payload.name)?;
    Ok((StatusCode::CREATED, Json(team)))
}

async fn join_team(
    State(state): State<SharedState>,
    session: UserSession,
    ApiJson(payload): ApiJson<JoinTeamRequest>,
) -> Result<Json<Team>, AppError> {
    let team = state
        .teams
        .write()
        .await
        .join_team(session.user_id, &payload.code)?;
    Ok(Json(team))
}

async fn leave_team(
    State(state): State<SharedState>,
    session: UserSession,
) -> Result<StatusCode, AppError> {
    state.teams.write().await.leave_team(session.user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn select_team(
    State(state): State<SharedState>,
    session: UserSession,
    ApiPath(team_id): ApiPath<Uuid>,
) -> Result<Json<Team>, AppError> {
    let team = state
        .teams
        .write()
        .await
        .select_team(session.user_id, team_id)?;
    Ok(Json(team))
}

async fn rename_team(
    State(state): State<SharedState>,
    session: UserSession,
    ApiJson(payload): ApiJson<TeamNameRequest>,
) -> Result<Json<Team>, AppError> {
    let mut teams = state.teams.write().await;
    let team_id = teams
        .active_team_id(session.user_id)
        .ok_or(AppError::Precondition("not in a team"))?;
    let team = teams.update_team(session.user_id, team_id, &payload.name)?;
    Ok(Json(team))
}

async fn list_members(
    State(state): State<SharedState>,
    session: UserSession,
) -> Result<Json<Vec<MemberView>>, AppError> {
    let (team, members) = {
        let teams = state.teams.read().await;
        let team = teams
            .active_team(session.user_id)
            .cloned()
            .ok_or(AppError::Precondition("not in a team"))?;
        let members = teams.members(team.id);
        (team, members)
    };
    Ok(Json(member_views(&state, &team, &members).await))
}

async fn remove_member(
    State(state): State<SharedState>,
    session: UserSession,
    ApiPath(member_id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    let mut teams = state.teams.write().await;
    let team_id = teams
        .active_team_id(session.user_id)
        .ok_or(AppError::Precondition("not in a team"))?;
    teams.remove_member(session.user_id, team_id, member_id)?;
    Ok(StatusCode::NO_CONTENT)
}
