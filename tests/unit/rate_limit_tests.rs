// ==============================
// tests/unit/rate_limit_tests.rs
// ==============================
//! Login lockout as configured through `Settings`
use backend_lib::auth::AuthRateLimiter;
use backend_lib::config::LoginLimitSettings;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

fn client(last: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(198, 51, 100, last))
}

#[test]
fn test_limiter_follows_settings() {
    let limiter = AuthRateLimiter::from_settings(&LoginLimitSettings {
        max_attempts: 2,
        lockout_secs: 900,
    });
    let ip = client(1);

    limiter.record_failed_attempt(ip);
    assert!(limiter.check_rate_limit(ip));
    limiter.record_failed_attempt(ip);
    assert!(!limiter.check_rate_limit(ip));

    let remaining = limiter.remaining_lockout(ip).unwrap();
    assert!(remaining > Duration::from_secs(890));
    assert!(remaining <= Duration::from_secs(900));
}

#[test]
fn test_default_allows_five_failures() {
    let limiter = AuthRateLimiter::default();
    let ip = IpAddr::V6(Ipv6Addr::LOCALHOST);

    for _ in 0..4 {
        limiter.record_failed_attempt(ip);
    }
    assert!(limiter.check_rate_limit(ip));
    limiter.record_failed_attempt(ip);
    assert!(!limiter.check_rate_limit(ip));
}

#[test]
fn test_clones_share_state() {
    let limiter = AuthRateLimiter::new(1, Duration::from_secs(60));
    let handle = limiter.clone();

    handle.record_failed_attempt(client(2));
    assert!(!limiter.check_rate_limit(client(2)));
    assert_eq!(limiter.tracked(), 1);

    limiter.record_success(client(2));
    assert!(handle.check_rate_limit(client(2)));
    assert_eq!(handle.tracked(), 0);
}

#[test]
fn test_failures_after_lockout_start_fresh() {
    let limiter = AuthRateLimiter::new(2, Duration::from_millis(20));
    let ip = client(3);

    limiter.record_failed_attempt(ip);
    limiter.record_failed_attempt(ip);
    assert!(!limiter.check_rate_limit(ip));

    std::thread::sleep(Duration::from_millis(30));
    limiter.record_failed_attempt(ip);
    assert!(limiter.check_rate_limit(ip));
}

#[test]
fn test_cleanup_keeps_recent_failures() {
    let limiter = AuthRateLimiter::new(3, Duration::from_secs(60));
    limiter.record_failed_attempt(client(4));
    limiter.record_failed_attempt(client(5));

    limiter.cleanup();
    assert_eq!(limiter.tracked(), 2);
}
