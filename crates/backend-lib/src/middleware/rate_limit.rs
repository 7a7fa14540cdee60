use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;

use crate::auth::client_ip;
use crate::config::RateLimitSettings;
use crate::{error::AppError, metrics, AppState};

/// Fixed-window request counter per client address
#[derive(Debug)]
pub struct RequestRateLimiter {
    entries: DashMap<IpAddr, RateLimitEntry>,
    max_requests: u32,
    window: Duration,
}

/// Rate limit entry for a client
#[derive(Debug)]
struct RateLimitEntry {
    requests: u32,
    window_start: Instant,
}

impl RequestRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::new(settings.max_requests, Duration::from_secs(settings.window_secs))
    }

    /// Count one request; `false` once the window's budget is spent
    pub fn check(&self, ip: IpAddr) -> bool {
        let mut entry = self.entries.entry(ip).or_insert_with(|| RateLimitEntry {
            requests: 0,
            window_start: Instant::now(),
        });

        if entry.window_start.elapsed() >= self.window {
            entry.requests = 0;
            entry.window_start = Instant::now();
        }

        if entry.requests >= self.max_requests {
            return false;
        }
        entry.requests += 1;
        true
    }

    /// Drop clients whose window has passed
    pub fn cleanup(&self) {
        self.entries
            .retain(|_, entry| entry.window_start.elapsed() < self.window);
    }

    pub fn tracked(&self) -> usize {
        self.entries.len()
    }
}

/// Rate limiter middleware
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(
        request.headers(),
        request.extensions(),
        state.settings.trust_proxy_headers,
    );

    if !state.rate_limiter.check(ip) {
        ::metrics::counter!(metrics::REQUEST_RATE_LIMITED).increment(1);
        tracing::debug!(%ip, "request rate limited");
        return Err(AppError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}
