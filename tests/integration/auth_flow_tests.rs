// ==================================
// tests/integration/auth_flow_tests.rs
// ==================================
//! Registration, login, refresh, logout and password changes over HTTP
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use backend_lib::config::LoginLimitSettings;
use serde_json::json;

use crate::test_utils::{test_settings, TestApp, PASSWORD};

#[tokio::test]
async fn test_register_login_and_me() {
    let app = TestApp::new().await;
    let user = app.register_and_login("strummer").await;

    let me = app.get("/api/auth/me", Some(&user.token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], "strummer");
    assert_eq!(me.body["role"], "user");
    assert!(me.body.get("password_hash").is_none());

    let anonymous = app.get("/api/auth/me", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_sets_http_only_cookies() {
    let app = TestApp::new().await;
    app.register_and_login("cookie").await;

    let res = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "cookie@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["token_type"], "Bearer");
    assert_eq!(res.body["expires_in"], 3600);

    let cookies = res.cookies();
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().any(|c| c.starts_with("access_token=")));
    assert!(cookies.iter().any(|c| c.starts_with("refresh_token=")));
    assert!(cookies.iter().all(|c| c.contains("HttpOnly")));
    assert!(cookies.iter().all(|c| !c.contains("Secure")));

    // The cookie alone authenticates
    let access = cookies
        .iter()
        .find(|c| c.starts_with("access_token="))
        .and_then(|c| c.split(';').next())
        .unwrap()
        .to_string();
    let request = Request::builder()
        .uri("/api/auth/me")
        .header(header::COOKIE, access)
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = TestApp::new().await;
    app.register_and_login("twin").await;

    let res = app
        .post(
            "/api/auth/register",
            None,
            json!({ "username": "twin", "email": "other@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app
        .post(
            "/api/auth/register",
            None,
            json!({ "username": "other", "email": "TWIN@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_weak_password_reports_field_errors() {
    let app = TestApp::new().await;
    let res = app
        .post(
            "/api/auth/register",
            None,
            json!({ "username": "weak", "email": "weak@example.com", "password": "password" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        res.headers.get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    assert_eq!(res.body["status"], 422);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert!(res.body["errors"]["password"].is_string());
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let res = app.send(request).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_refresh_from_body_and_bearer() {
    let app = TestApp::new().await;
    let user = app.register_and_login("refresher").await;

    let res = app
        .post("/api/auth/refresh", None, json!({ "refresh_token": user.refresh_token }))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let fresh = res.body["access_token"].as_str().unwrap().to_string();
    assert!(res.body.get("refresh_token").is_none());
    assert_eq!(app.get("/api/auth/me", Some(&fresh)).await.status, StatusCode::OK);

    let res = app
        .request(Method::POST, "/api/auth/refresh", Some(&user.refresh_token), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);

    // An access token is not a refresh token, and vice versa
    let res = app
        .request(Method::POST, "/api/auth/refresh", Some(&user.token), None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        app.get("/api/auth/me", Some(&user.refresh_token)).await.status,
        StatusCode::UNAUTHORIZED
    );

    let res = app.request(Method::POST, "/api/auth/refresh", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = TestApp::new().await;
    let user = app.register_and_login("leaver").await;

    let res = app
        .request(Method::POST, "/api/auth/logout", Some(&user.token), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.cookies().iter().all(|c| c.contains("Max-Age=0")));

    assert_eq!(
        app.get("/api/auth/me", Some(&user.token)).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_login_lockout_is_per_ip() {
    let app = TestApp::with_settings(backend_lib::config::Settings {
        login_limit: LoginLimitSettings {
            max_attempts: 3,
            lockout_secs: 300,
        },
        ..test_settings()
    })
    .await;
    app.register_and_login("target").await;

    let wrong = json!({ "username_or_email": "target", "password": "Wr0ng!pass" });
    for _ in 0..3 {
        let res = app
            .request_from("198.51.100.7", Method::POST, "/api/auth/login", None, Some(wrong.clone()))
            .await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    }

    let right = json!({ "username_or_email": "target", "password": PASSWORD });
    let res = app
        .request_from("198.51.100.7", Method::POST, "/api/auth/login", None, Some(right.clone()))
        .await;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.body["code"], "AUTH_RATE_LIMITED");

    let res = app
        .request_from("198.51.100.8", Method::POST, "/api/auth/login", None, Some(right))
        .await;
    assert_eq!(res.status, StatusCode::OK);
}

fn login_request(forwarded_for: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header("x-forwarded-for", forwarded_for)
}

#[tokio::test]
async fn test_forwarded_for_does_not_reset_lockout() {
    let app = TestApp::with_settings(backend_lib::config::Settings {
        login_limit: LoginLimitSettings {
            max_attempts: 5,
            lockout_secs: 300,
        },
        ..test_settings()
    })
    .await;
    app.register_and_login("guarded").await;

    let wrong = json!({ "username_or_email": "guarded", "password": "Wr0ng!pass" });
    let mut statuses = Vec::new();
    for i in 0..8 {
        let res = app
            .send_from("198.51.100.7", login_request(&format!("10.0.0.{i}")), Some(wrong.clone()))
            .await;
        statuses.push(res.status);
    }
    assert_eq!(statuses[..5], [StatusCode::UNAUTHORIZED; 5]);
    assert_eq!(statuses[5..], [StatusCode::TOO_MANY_REQUESTS; 3]);
}

#[tokio::test]
async fn test_proxy_headers_when_trusted() {
    let app = TestApp::with_settings(backend_lib::config::Settings {
        trust_proxy_headers: true,
        login_limit: LoginLimitSettings {
            max_attempts: 2,
            lockout_secs: 300,
        },
        ..test_settings()
    })
    .await;
    app.register_and_login("proxied").await;

    let wrong = json!({ "username_or_email": "proxied", "password": "Wr0ng!pass" });
    for _ in 0..2 {
        // Spoofed leading hops are ignored, the proxy's own entry counts
        let builder = login_request("1.1.1.1, 192.0.2.50");
        app.send_from("10.0.0.2", builder, Some(wrong.clone())).await;
    }
    let res = app
        .send_from("10.0.0.2", login_request("9.9.9.9, 192.0.2.50"), Some(wrong.clone()))
        .await;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);

    // Another client behind the same proxy is unaffected
    let res = app
        .send_from("10.0.0.2", login_request("192.0.2.51"), Some(wrong))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new().await;
    let user = app.register_and_login("rotator").await;

    let res = app
        .post(
            "/api/auth/change-password",
            Some(&user.token),
            json!({ "current_password": "Wr0ng!pass", "new_password": "N3w!password" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .post(
            "/api/auth/change-password",
            Some(&user.token),
            json!({ "current_password": PASSWORD, "new_password": "short" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.body["errors"]["new_password"].is_string());

    let res = app
        .post(
            "/api/auth/change-password",
            Some(&user.token),
            json!({ "current_password": PASSWORD, "new_password": "N3w!password" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app
        .post(
            "/api/auth/login",
            None,
            json!({ "username_or_email": "rotator", "password": "N3w!password" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_profile() {
    let app = TestApp::new().await;
    let user = app.register_and_login("profiled").await;

    let res = app
        .put(
            "/api/auth/me",
            Some(&user.token),
            json!({ "first_name": "Django", "last_name": "Reinhardt", "website_url": "not a url" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);

    let res = app
        .put(
            "/api/auth/me",
            Some(&user.token),
            json!({ "first_name": "Django", "last_name": "Reinhardt" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["full_name"], "Django Reinhardt");
    assert_eq!(res.body["data"]["initials"], "DR");
}

#[tokio::test]
async fn test_deactivated_user_token_rejected() {
    let app = TestApp::new().await;
    let user = app.register_and_login("ghost").await;
    backend_lib::db::users::set_active(&app.state.db, user.id, false)
        .await
        .unwrap();

    assert_eq!(
        app.get("/api/auth/me", Some(&user.token)).await.status,
        StatusCode::UNAUTHORIZED
    );
    let res = app
        .post(
            "/api/auth/login",
            None,
            json!({ "username_or_email": "ghost", "password": PASSWORD }),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}
