// ==============================
// tests/unit/middleware_tests.rs
// ==============================
//! Per-IP request limiting through the full router
use axum::http::{Method, StatusCode};
use backend_lib::config::{RateLimitSettings, Settings};

use crate::test_utils::{test_settings, TestApp};

#[tokio::test]
async fn test_request_limit_applies_per_ip() {
    let app = TestApp::with_settings(Settings {
        rate_limit: RateLimitSettings {
            max_requests: 3,
            window_secs: 60,
        },
        ..test_settings()
    })
    .await;

    for _ in 0..3 {
        let res = app.request_from("192.0.2.10", Method::GET, "/health", None, None).await;
        assert_eq!(res.status, StatusCode::OK);
    }

    let res = app.request_from("192.0.2.10", Method::GET, "/health", None, None).await;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.body["code"], "RATE_LIMITED");

    let res = app.request_from("192.0.2.11", Method::GET, "/health", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(app.state.rate_limiter.tracked(), 2);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new().await;
    let res = app.get("/api/does-not-exist", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
