use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::rate_limit::RateLimiter;

/// Shared application state available to all request handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// State backed by the in-process counter store.
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let rate_limiter = RateLimiter::in_memory(
            config.rate_limit_max_requests,
            config.rate_limit_window_secs,
        );
        Self {
            db,
            config: Arc::new(config),
            rate_limiter,
        }
    }

    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }
}
