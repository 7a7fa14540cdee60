//! Admin user management, statistics and moderation over HTTP
use axum::http::{Method, StatusCode};
use guitartab_common::Role;
use serde_json::json;

use crate::test_utils::{song, TestApp};

#[tokio::test]
async fn test_admin_routes_reject_non_admins() {
    let app = TestApp::new().await;
    let user = app.register_and_login("pleb").await;
    let moderator = app.user_with_role("middle", Role::Moderator).await;

    for token in [&user.token, &moderator.token] {
        assert_eq!(app.get("/api/admin/users", Some(token)).await.status, StatusCode::FORBIDDEN);
        assert_eq!(
            app.get("/api/admin/system/stats", Some(token)).await.status,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            app.get("/api/admin/moderation", Some(token)).await.status,
            StatusCode::FORBIDDEN
        );
    }
    assert_eq!(app.get("/api/admin/users", None).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_users_with_filters() {
    let app = TestApp::new().await;
    let admin = app.user_with_role("admin1", Role::Admin).await;
    app.register_and_login("alice").await;
    app.register_and_login("alfred").await;
    app.user_with_role("bob", Role::Moderator).await;

    let res = app.get("/api/admin/users", Some(&admin.token)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["pagination"]["total"], 4);
    assert_eq!(res.body["pagination"]["per_page"], 20);

    let res = app.get("/api/admin/users?search=al", Some(&admin.token)).await;
    assert_eq!(res.body["pagination"]["total"], 2);

    let res = app.get("/api/admin/users?role=moderator", Some(&admin.token)).await;
    assert_eq!(res.body["pagination"]["total"], 1);
    assert_eq!(res.body["items"][0]["username"], "bob");

    let res = app.get("/api/admin/users?role=overlord", Some(&admin.token)).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_role_changes() {
    let app = TestApp::new().await;
    let admin = app.user_with_role("root", Role::Admin).await;
    let user = app.register_and_login("climber").await;
    let role_uri = format!("/api/admin/users/{}/role", user.id);

    let res = app.put(&role_uri, Some(&admin.token), json!({ "role": "superuser" })).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.body["errors"]["role"].is_string());

    let res = app
        .put(
            &format!("/api/admin/users/{}/role", admin.id),
            Some(&admin.token),
            json!({ "role": "user" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.put(&role_uri, Some(&admin.token), json!({ "role": "moderator" })).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["new_role"], "moderator");

    // The role is read per request, so the existing token picks it up
    let queue = app.get("/api/songs/moderation", Some(&user.token)).await;
    assert_eq!(queue.status, StatusCode::OK);

    let promote_uri = format!("/api/admin/users/{}/promote", user.id);
    let res = app.delete(&promote_uri, Some(&admin.token)).await;
    assert_eq!(res.body["data"]["new_role"], "user");
    let res = app.request(Method::POST, &promote_uri, Some(&admin.token), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["new_role"], "moderator");

    let res = app
        .put(
            &format!("/api/admin/users/{}/role", uuid::Uuid::new_v4()),
            Some(&admin.token),
            json!({ "role": "user" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_activation() {
    let app = TestApp::new().await;
    let admin = app.user_with_role("warden", Role::Admin).await;
    let user = app.register_and_login("suspended").await;
    let uri = format!("/api/admin/users/{}/activate", user.id);

    let res = app.delete(&format!("/api/admin/users/{}/activate", admin.id), Some(&admin.token)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.delete(&uri, Some(&admin.token)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["is_active"], false);
    assert_eq!(app.get("/api/auth/me", Some(&user.token)).await.status, StatusCode::UNAUTHORIZED);

    let res = app.get("/api/admin/users?is_active=false", Some(&admin.token)).await;
    assert_eq!(res.body["pagination"]["total"], 1);

    let res = app.request(Method::POST, &uri, Some(&admin.token), None).await;
    assert_eq!(res.body["data"]["is_active"], true);
    assert_eq!(app.get("/api/auth/me", Some(&user.token)).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_system_stats_and_moderation() {
    let app = TestApp::new().await;
    let admin = app.user_with_role("stats", Role::Admin).await;
    let user = app.register_and_login("content").await;
    let fan = app.register_and_login("listener").await;
    let first = app
        .create_song(&user.token, json!({ "title": "Lyrical", "artist": "A", "lyrics": "la la" }))
        .await;
    let second = app.create_song(&user.token, song("Plain")).await;
    app.create_song(&user.token, json!({ "title": "Hidden", "artist": "A", "is_public": false }))
        .await;

    app.post(&format!("/api/songs/{first}/rate"), Some(&fan.token), json!({ "rating": 4 })).await;
    app.post(&format!("/api/songs/{second}/rate"), Some(&fan.token), json!({ "rating": 3 })).await;
    app.post(&format!("/api/songs/{second}/flag"), Some(&fan.token), json!({ "reason": "spam" })).await;
    app.get(&format!("/api/songs/{first}"), None).await;

    let res = app.get("/api/admin/system/stats", Some(&admin.token)).await;
    assert_eq!(res.status, StatusCode::OK);
    let stats = &res.body;
    assert_eq!(stats["users"]["total"], 3);
    assert_eq!(stats["users"]["admins"], 1);
    assert_eq!(stats["songs"]["total"], 3);
    assert_eq!(stats["songs"]["public"], 2);
    assert_eq!(stats["songs"]["flagged"], 1);
    assert_eq!(stats["content"]["with_lyrics"], 1);
    assert_eq!(stats["engagement"]["total_views"], 1);
    assert_eq!(stats["engagement"]["average_rating"], 3.5);

    let queue = app.get("/api/admin/moderation", Some(&admin.token)).await;
    assert_eq!(queue.status, StatusCode::OK);
    assert_eq!(queue.body["pagination"]["total"], 1);
    assert_eq!(queue.body["items"][0]["id"], second.to_string());
    assert_eq!(queue.body["items"][0]["uploader"], "content");
}
