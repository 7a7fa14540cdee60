// ============================
// guitartab-backend/src/lib.rs
// ============================
//! Core functionality of the GuitarTab Pro REST API.

pub mod auth;
pub mod authz;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod pagination;
pub mod router;
pub mod services;
pub mod validation;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::{AuthRateLimiter, AuthService, DefaultAuth};
use crate::config::Settings;
use crate::middleware::RequestRateLimiter;

pub use router::create_router;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Connection pool
    pub db: SqlitePool,
    /// Settings manager
    pub settings: Arc<Settings>,
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Login lockout per client IP
    pub login_limiter: AuthRateLimiter,
    /// Request limiter per client IP
    pub rate_limiter: Arc<RequestRateLimiter>,
}

impl AppState {
    /// Create a new application state
    pub fn new(db: SqlitePool, settings: Settings) -> Self {
        let auth = Arc::new(DefaultAuth::new(&settings.auth));
        let login_limiter = AuthRateLimiter::from_settings(&settings.login_limit);
        let rate_limiter = Arc::new(RequestRateLimiter::from_settings(&settings.rate_limit));

        Self {
            db,
            settings: Arc::new(settings),
            auth,
            login_limiter,
            rate_limiter,
        }
    }

    /// Drop expired limiter entries and revoked tokens
    pub fn purge_expired(&self) {
        self.login_limiter.cleanup();
        self.rate_limiter.cleanup();
        self.auth.purge_revoked();
    }
}
