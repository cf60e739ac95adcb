use crate::domain::models::{Team, User};
use crate::error::AppError;
use crate::middleware::rate_limit::rate_limit_middleware;
use crate::services::auth as accounts;
use crate::state::SharedState;
use crate::web::extract::ApiJson;
use crate::web::session::{self, UserSession};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub user: User,
    pub token: String,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: User,
    pub active_team: Option<Team>,
}

pub fn router(state: SharedState) -> Router {
    let credentials = Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            state.login_limiter.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .merge(credentials)
        .route("/logout", post(logout))
        .route("/me", get(me).put(update_me))
        .with_state(state)
}

/// Signing up also opens a session so the client lands logged in.
async fn signup(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (user, session_id) =
        accounts::signup(&state.auth, &payload.email, &payload.name, &payload.password).await?;
    session_response(&state, StatusCode::CREATED, user, session_id)
}

async fn login(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (user, session_id) = accounts::login(&state.auth, &payload.email, &payload.password)
        .await
        .map_err(|e| {
            tracing::warn!("Failed login attempt for {}", payload.email.trim());
            e
        })?;
    session_response(&state, StatusCode::OK, user, session_id)
}

async fn logout(
    State(state): State<SharedState>,
    session: UserSession,
) -> Result<impl IntoResponse, AppError> {
    state.auth.write().await.logout(session.session_id);

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session::cleared_cookie()?);
    Ok((StatusCode::NO_CONTENT, headers))
}

async fn me(
    State(state): State<SharedState>,
    session: UserSession,
) -> Result<Json<MeResponse>, AppError> {
    let user = state
        .auth
        .read()
        .await
        .find_user(session.user_id)
        .cloned()
        .ok_or(AppError::Unauthorized)?;
    let active_team = state.teams.read().await.active_team(session.user_id).cloned();
    Ok(Json(MeResponse { user, active_team }))
}

async fn update_me(
    State(state): State<SharedState>,
    session: UserSession,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> Result<Json<User>, AppError> {
    let user = state
        .auth
        .write()
        .await
        .update_profile(session.user_id, payload.name, payload.avatar)?;
    tracing::info!("User {} updated profile", user.id);
    Ok(Json(user))
}

fn session_response(
    state: &SharedState,
    status: StatusCode,
    user: User,
    session_id: Uuid,
) -> Result<impl IntoResponse, AppError> {
    let token = session::sign_session(user.id, session_id, &state.session_key).map_err(|e| {
        tracing::error!("Failed to sign session for {}: {}", user.id, e);
        AppError::Storage("could not issue session".into())
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session::session_cookie(&token)?);
    Ok((status, headers, Json(SessionResponse { user, token })))
}
