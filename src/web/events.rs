use crate::db::seed::{self, DemoSeed};
use crate::domain::models::{Activity, ActivityKind, Blocker, Mood, MoodEntry};
use crate::error::AppError;
use crate::state::SharedState;
use crate::web::{
    extract::{ApiJson, ApiPath},
    session::UserSession,
    team_scope,
    write_context,
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize)]
pub struct LogActivityRequest {
    pub kind: ActivityKind,
    #[serde(default = "default_value")]
    pub value: i64,
    pub details: Option<String>,
}

fn default_value() -> i64 {
    1
}

#[derive(Deserialize)]
pub struct ReportBlockerRequest {
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct LogMoodRequest {
    pub mood: Mood,
    pub note: Option<String>,
}

#[derive(Serialize)]
pub struct BlockerReport {
    pub blocker: Blocker,
    pub activity: Activity,
}

#[derive(Serialize)]
pub struct DemoReport {
    pub activities: usize,
    pub blockers: usize,
    pub moods: usize,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/activities", post(log_activity))
        .route("/blockers", post(report_blocker))
        .route("/blockers/:id/resolve", post(resolve_blocker))
        .route("/moods", post(log_mood))
        .route("/demo", post(generate_demo))
        .with_state(state)
}

async fn log_activity(
    State(state): State<SharedState>,
    session: UserSession,
    ApiJson(payload): ApiJson<LogActivityRequest>,
) -> Result<(StatusCode, Json<Activity>), AppError> {
    let ctx = write_context(&state, session.user_id).await;
    let activity = state
        .store
        .write()
        .await
        .log_activity(&ctx, payload.kind, payload.value, payload.details)?;
    Ok((StatusCode::CREATED, Json(activity)))
}

async fn report_blocker(
    State(state): State<SharedState>,
    session: UserSession,
    ApiJson(payload): ApiJson<ReportBlockerRequest>,
) -> Result<(StatusCode, Json<BlockerReport>), AppError> {
    let ctx = write_context(&state, session.user_id).await;
    let (blocker, activity) = state
        .store
        .write()
        .await
        .log_blocker(&ctx, &payload.description, payload.tags)?;
    Ok((StatusCode::CREATED, Json(BlockerReport { blocker, activity })))
}

async fn resolve_blocker(
    State(state): State<SharedState>,
    session: UserSession,
    ApiPath(blocker_id): ApiPath<Uuid>,
) -> Result<Json<Blocker>, AppError> {
    let ctx = write_context(&state, session.user_id).await;
    let blocker = state.store.write().await.resolve_blocker(&ctx, blocker_id)?;
    Ok(Json(blocker))
}

async fn log_mood(
    State(state): State<SharedState>,
    session: UserSession,
    ApiJson(payload): ApiJson<LogMoodRequest>,
) -> Result<(StatusCode, Json<MoodEntry>), AppError> {
    let ctx = write_context(&state, session.user_id).await;
    let entry = state
        .store
        .write()
        .await
        .log_mood(&ctx, payload.mood, payload.note)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Fills the active team with two weeks of plausible history.
async fn generate_demo(
    State(state): State<SharedState>,
    session: UserSession,
) -> Result<Json<DemoReport>, AppError> {
    let scope = team_scope(&state, session.user_id)
        .await
        .ok_or(AppError::Precondition("not in a team"))?;

    // Existing history perturbs the seed; repeat runs must not reuse ids.
    let existing = (scope.events.activities.len() + scope.events.moods.len()) as u64;
    let plan = DemoSeed {
        team_id: scope.team.id,
        members: scope.members,
        today: state.config.timezone.today(),
        timezone: state.config.timezone,
        now: Utc::now(),
        seed: state.config.demo_seed ^ (scope.team.id.as_u128() as u64) ^ existing,
    };
    let generated = seed::generate(&plan);
    let report = DemoReport {
        activities: generated.activities.len(),
        blockers: generated.blockers.len(),
        moods: generated.moods.len(),
    };

    state.store.write().await.append(generated);
    tracing::info!("User {} generated demo data for team {}", session.user_id, plan.team_id);
    Ok(Json(report))
}
