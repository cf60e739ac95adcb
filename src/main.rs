mod analytics;
mod config;
mod db;
mod domain;
mod error;
mod middleware;
mod services;
mod state;
mod time_utils;
mod web;

use crate::config::Config;
use crate::db::{persist::JsonFilePersistence, EventStore};
use crate::services::auth::AuthService;
use crate::state::{AppState, SharedState};
use axum::Router;
use std::net::SocketAddr;
use tokio_cron_scheduler::{Job, JobScheduler};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        "Calendar days in {}, default window {} days",
        config.timezone_name,
        config.window_days
    );

    tracing::info!("Loading event store from {}", config.store_path.display());
    let store = EventStore::open(Box::new(JsonFilePersistence::new(config.store_path.clone()))).map_err(|e| {
        tracing::error!("Failed to load event store: {:#}", e);
        e
    })?;
    tracing::info!(
        "Event store loaded: {} activities, {} blockers, {} moods",
        store.log().activities.len(),
        store.log().blockers.len(),
        store.log().moods.len()
    );

    let bind_addr = config.bind_addr.clone();
    let shared: SharedState = AppState::new(config, store, AuthService::new());

    // Hourly sweep of idle rate-limit buckets
    let scheduler = JobScheduler::new().await?;
    let shared_for_cleanup = shared.clone();
    scheduler
        .add(Job::new_async("0 0 * * * *", move |_uuid, _l| {
            let state = shared_for_cleanup.clone();
            Box::pin(async move {
                state.login_limiter.cleanup().await;
            })
        })?)
        .await?;
    scheduler.start().await?;
    tracing::info!("Scheduler started: rate limiter cleanup hourly");

    let app = Router::new()
        .merge(web::routes(shared.clone()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on {bind_addr}");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
