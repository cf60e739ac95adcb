use crate::analytics::blockers::{blocker_alert, BlockerAlert};
use crate::analytics::daily::{bucket_daily, DailySummary};
use crate::analytics::heatmap::{member_heatmap, Heatmap};
use crate::analytics::morale::{estimate_morale, NEUTRAL_MORALE};
use crate::analytics::pulse::{pulse_trend, PulseTrend, PULSE_DAYS};
use crate::analytics::team_summary::{summarize_team, TeamSummary};
use crate::analytics::user_summary::{summarize_user, UserSummary};
use crate::analytics::TrailingWindow;
use crate::config::MAX_WINDOW_DAYS;
use crate::error::AppError;
use crate::state::SharedState;
use crate::web::{
    extract::{ApiPath, ApiQuery},
    member_views,
    session::UserSession,
    team_scope,
    MemberView,
};
use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const RECENT_BLOCKERS: usize = 3;

#[derive(Deserialize)]
pub struct WindowQuery {
    pub days: Option<i64>,
}

#[derive(Serialize)]
pub struct MemberSummaryResponse {
    #[serde(flatten)]
    pub summary: UserSummary,
    pub name: Option<String>,
}

#[derive(Serialize)]
pub struct TeamDashboard {
    pub summary: Option<TeamSummary>,
    pub members: Vec<MemberView>,
}

#[derive(Serialize)]
pub struct MoraleResponse {
    pub morale: f64,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/daily", get(daily))
        .route("/users/:id", get(user_summary))
        .route("/team", get(team_summary))
        .route("/morale", get(morale))
        .route("/heatmap", get(heatmap))
        .route("/pulse", get(pulse))
        .route("/blockers", get(blockers))
        .with_state(state)
}

/// Non-positive days yield an empty window; oversized ones are rejected.
fn resolve_window(state: &SharedState, query: &WindowQuery) -> Result<TrailingWindow, AppError> {
    if let Some(days) = query.days {
        if days > MAX_WINDOW_DAYS {
            return Err(AppError::Validation(format!(
                "days must be at most {MAX_WINDOW_DAYS}"
            )));
        }
    }
    Ok(state.window(query.days))
}

async fn daily(
    State(state): State<SharedState>,
    session: UserSession,
    ApiQuery(query): ApiQuery<WindowQuery>,
) -> Result<Json<Vec<DailySummary>>, AppError> {
    let window = resolve_window(&state, &query)?;
    let Some(scope) = team_scope(&state, session.user_id).await else {
        return Ok(Json(Vec::new()));
    };
    Ok(Json(bucket_daily(&scope.events.activities, &window)))
}

async fn user_summary(
    State(state): State<SharedState>,
    session: UserSession,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<WindowQuery>,
) -> Result<Json<MemberSummaryResponse>, AppError> {
    let window = resolve_window(&state, &query)?;
    let summary = match team_scope(&state, session.user_id).await {
        Some(scope) => summarize_user(user_id, &scope.events.activities, &window),
        None => UserSummary::empty(user_id),
    };
    let name = state
        .auth
        .read()
        .await
        .find_user(user_id)
        .map(|u| u.name.clone());
    Ok(Json(MemberSummaryResponse { summary, name }))
}

async fn team_summary(
    State(state): State<SharedState>,
    session: UserSession,
    ApiQuery(query): ApiQuery<WindowQuery>,
) -> Result<Json<TeamDashboard>, AppError> {
    let window = resolve_window(&state, &query)?;
    let Some(scope) = team_scope(&state, session.user_id).await else {
        return Ok(Json(TeamDashboard {
            summary: None,
            members: Vec::new(),
        }));
    };

    let summary = summarize_team(
        &scope.team,
        &scope.events.activities,
        &scope.events.blockers,
        &scope.members,
        &window,
    );
    let members = member_views(&state, &scope.team, &scope.members).await;
    Ok(Json(TeamDashboard { summary, members }))
}

async fn morale(
    State(state): State<SharedState>,
    session: UserSession,
    ApiQuery(query): ApiQuery<WindowQuery>,
) -> Result<Json<MoraleResponse>, AppError> {
    let window = resolve_window(&state, &query)?;
    let morale = match team_scope(&state, session.user_id).await {
        Some(scope) => estimate_morale(&scope.events.moods, &window),
        None => NEUTRAL_MORALE,
    };
    Ok(Json(MoraleResponse { morale }))
}

async fn heatmap(
    State(state): State<SharedState>,
    session: UserSession,
    ApiQuery(query): ApiQuery<WindowQuery>,
) -> Result<Json<Heatmap>, AppError> {
    let window = resolve_window(&state, &query)?;
    let heatmap = match team_scope(&state, session.user_id).await {
        Some(scope) => member_heatmap(&scope.events.activities, &scope.members, &window),
        None => member_heatmap(&[], &[], &window),
    };
    Ok(Json(heatmap))
}

async fn pulse(State(state): State<SharedState>, session: UserSession) -> Json<PulseTrend> {
    let window = state.window(Some(PULSE_DAYS));
    let morale_window = state.window(None);
    let trend = match team_scope(&state, session.user_id).await {
        Some(scope) => pulse_trend(
            &scope.events.activities,
            &scope.events.moods,
            &window,
            &morale_window,
        ),
        None => pulse_trend(&[], &[], &window, &morale_window),
    };
    Json(trend)
}

async fn blockers(State(state): State<SharedState>, session: UserSession) -> Json<BlockerAlert> {
    let blockers = team_scope(&state, session.user_id)
        .await
        .map(|scope| scope.events.blockers)
        .unwrap_or_default();
    Json(blocker_alert(&blockers, RECENT_BLOCKERS))
}
