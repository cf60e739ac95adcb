use crate::analytics::TrailingWindow;
use crate::config::Config;
use crate::db::EventStore;
use crate::middleware::RateLimiter;
use crate::services::{auth::AuthService, teams::TeamDirectory};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Guards are taken one at a time; handlers never hold two locks at once.
pub struct AppState {
    pub config: Config,
    pub session_key: Vec<u8>,
    pub store: RwLock<EventStore>,
    pub auth: RwLock<AuthService>,
    pub teams: RwLock<TeamDirectory>,
    pub login_limiter: RateLimiter,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: Config, store: EventStore, auth: AuthService) -> SharedState {
        Arc::new(Self {
            session_key: config.session_key.clone(),
            config,
            store: RwLock::new(store),
            auth: RwLock::new(auth),
            teams: RwLock::new(TeamDirectory::new()),
            login_limiter: RateLimiter::for_login(),
        })
    }

    /// Window of `days` ending today in the configured timezone.
    pub fn window(&self, days: Option<i64>) -> TrailingWindow {
        TrailingWindow::ending_today(days.unwrap_or(self.config.window_days), self.config.timezone)
    }
}
