// ============================
// crates/backend-lib/src/auth/rate_limit.rs
// ============================
//! Brute-force protection for the login endpoint.

use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::LoginLimitSettings;

/// Failed-login bookkeeping for one client
#[derive(Debug, Clone)]
struct LoginAttempts {
    failures: u32,
    last_failure: Instant,
    /// Set once `failures` reaches the limit
    locked_until: Option<Instant>,
}

/// Counts failed logins per client IP and locks the IP out once the limit
/// is reached
#[derive(Debug, Clone)]
pub struct AuthRateLimiter {
    attempts: Arc<DashMap<IpAddr, LoginAttempts>>,
    max_attempts: u32,
    lockout_duration: Duration,
}

impl Default for AuthRateLimiter {
    fn default() -> Self {
        Self::from_settings(&LoginLimitSettings::default())
    }
}

impl AuthRateLimiter {
    pub fn new(max_attempts: u32, lockout_duration: Duration) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_attempts,
            lockout_duration,
        }
    }

    pub fn from_settings(settings: &LoginLimitSettings) -> Self {
        Self::new(settings.max_attempts, Duration::from_secs(settings.lockout_secs))
    }

    /// Record a failed login
    pub fn record_failed_attempt(&self, ip: IpAddr) {
        let now = Instant::now();

        let mut entry = self.attempts.entry(ip).or_insert_with(|| LoginAttempts {
            failures: 0,
            last_failure: now,
            locked_until: None,
        });

        // A lockout that ran out starts a fresh count
        if entry.locked_until.is_some_and(|until| now >= until) {
            entry.failures = 0;
            entry.locked_until = None;
        }

        entry.failures += 1;
        entry.last_failure = now;

        if entry.failures >= self.max_attempts && entry.locked_until.is_none() {
            entry.locked_until = Some(now + self.lockout_duration);
            tracing::warn!(%ip, failures = entry.failures, "client locked out after failed logins");
        }
    }

    /// Forget the failures of a client that logged in
    pub fn record_success(&self, ip: IpAddr) {
        self.attempts.remove(&ip);
    }

    /// Whether the client may attempt a login now
    pub fn check_rate_limit(&self, ip: IpAddr) -> bool {
        self.remaining_lockout(ip).is_none()
    }

    /// Time left on the client's lockout, if any
    pub fn remaining_lockout(&self, ip: IpAddr) -> Option<Duration> {
        let entry = self.attempts.get(&ip)?;
        let until = entry.locked_until?;
        until.checked_duration_since(Instant::now()).filter(|d| !d.is_zero())
    }

    /// Drop expired lockouts and stale failure counts
    pub fn cleanup(&self) {
        let now = Instant::now();
        let stale_after = self.lockout_duration.max(Duration::from_secs(60 * 60));

        self.attempts.retain(|_, entry| match entry.locked_until {
            Some(until) => now < until,
            None => now.duration_since(entry.last_failure) < stale_after,
        });
    }

    /// Number of tracked clients
    pub fn tracked(&self) -> usize {
        self.attempts.len()
    }
}
