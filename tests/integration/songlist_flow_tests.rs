//! Songlists and their entries over HTTP
use axum::http::StatusCode;
use guitartab_common::Role;
use serde_json::json;

use crate::test_utils::{song, TestApp};

#[tokio::test]
async fn test_songlist_lifecycle() {
    let app = TestApp::new().await;
    let owner = app.register_and_login("setlister").await;
    let first = app.create_song(&owner.token, song("Opener")).await;
    let second = app.create_song(&owner.token, song("Closer")).await;

    let res = app
        .post(
            "/api/songlists",
            Some(&owner.token),
            json!({ "name": "  Friday Gig ", "description": "Two sets" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["data"]["name"], "Friday Gig");
    assert_eq!(res.body["data"]["is_public"], false);
    let id = res.body["data"]["id"].as_str().unwrap().to_string();
    let songs_uri = format!("/api/songlists/{id}/songs");

    let res = app.post(&songs_uri, Some(&owner.token), json!({ "song_id": second })).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["data"]["position"], 1);
    let res = app
        .post(
            &songs_uri,
            Some(&owner.token),
            json!({ "song_id": first, "position": 0, "notes": "capo 2" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);

    let res = app
        .post(&songs_uri, Some(&owner.token), json!({ "song_id": first, "notes": "capo 2" }))
        .await;
    assert_eq!(res.body["data"]["position"], 2);
    assert_eq!(
        app.post(&songs_uri, Some(&owner.token), json!({ "song_id": first })).await.status,
        StatusCode::CONFLICT
    );

    // Reorder: move the closer to the end
    let res = app
        .put(&format!("{songs_uri}/{second}"), Some(&owner.token), json!({ "position": 10 }))
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let detail = app.get(&format!("/api/songlists/{id}"), Some(&owner.token)).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["song_count"], 2);
    let entries = detail.body["entries"].as_array().unwrap();
    assert_eq!(entries[0]["song"]["title"], "Opener");
    assert_eq!(entries[0]["notes"], "capo 2");
    assert_eq!(entries[1]["song"]["title"], "Closer");
    assert_eq!(entries[1]["position"], 10);

    let res = app.delete(&format!("{songs_uri}/{second}"), Some(&owner.token)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        app.delete(&format!("{songs_uri}/{second}"), Some(&owner.token)).await.status,
        StatusCode::NOT_FOUND
    );

    let own = app.get("/api/songlists?per_page=5", Some(&owner.token)).await;
    assert_eq!(own.body["pagination"]["total"], 1);
    assert_eq!(own.body["items"][0]["song_count"], 1);

    assert_eq!(
        app.delete(&format!("/api/songlists/{id}"), Some(&owner.token)).await.status,
        StatusCode::OK
    );
    assert_eq!(
        app.get(&format!("/api/songlists/{id}"), Some(&owner.token)).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_songlist_access() {
    let app = TestApp::new().await;
    let owner = app.register_and_login("private").await;
    let stranger = app.register_and_login("stranger").await;
    let admin = app.user_with_role("overseer", Role::Admin).await;

    let res = app.post("/api/songlists", Some(&owner.token), json!({ "name": "Mine" })).await;
    let id = res.body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/songlists/{id}");

    assert_eq!(app.get(&uri, None).await.status, StatusCode::FORBIDDEN);
    assert_eq!(app.get(&uri, Some(&stranger.token)).await.status, StatusCode::FORBIDDEN);
    assert_eq!(app.get(&uri, Some(&admin.token)).await.status, StatusCode::OK);
    assert_eq!(
        app.put(&uri, Some(&stranger.token), json!({ "name": "Hijacked" })).await.status,
        StatusCode::FORBIDDEN
    );

    let res = app.put(&uri, Some(&owner.token), json!({ "is_public": true })).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(app.get(&uri, None).await.status, StatusCode::OK);

    // Listing only ever shows the caller's own lists
    let listed = app.get("/api/songlists", Some(&stranger.token)).await;
    assert_eq!(listed.body["pagination"]["total"], 0);
    assert_eq!(app.get("/api/songlists", None).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_public_songlist_hides_songs_made_private() {
    let app = TestApp::new().await;
    let owner = app.register_and_login("curator").await;
    let fan = app.register_and_login("browser").await;
    let moderator = app.user_with_role("gatekeeper", Role::Moderator).await;
    let demo = app.create_song(&owner.token, song("Secret Demo")).await;
    let single = app.create_song(&owner.token, song("Single")).await;

    let res = app
        .post("/api/songlists", Some(&owner.token), json!({ "name": "Showcase", "is_public": true }))
        .await;
    let id = res.body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/songlists/{id}");
    for song_id in [demo, single] {
        let res = app
            .post(&format!("{uri}/songs"), Some(&owner.token), json!({ "song_id": song_id }))
            .await;
        assert_eq!(res.status, StatusCode::CREATED);
    }

    let res = app
        .put(&format!("/api/songs/{demo}"), Some(&owner.token), json!({ "is_public": false }))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    app.post(&format!("/api/songs/{single}/flag"), Some(&fan.token), json!({ "reason": "wrong key" }))
        .await;

    for token in [None, Some(fan.token.as_str())] {
        let res = app.get(&uri, token).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["entries"].as_array().unwrap().len(), 0);
        assert!(!res.body.to_string().contains("Secret Demo"));
    }

    // The owner still sees their own songs, staff see everything
    let res = app.get(&uri, Some(&owner.token)).await;
    assert_eq!(res.body["entries"].as_array().unwrap().len(), 2);
    let res = app.get(&uri, Some(&moderator.token)).await;
    assert_eq!(res.body["entries"].as_array().unwrap().len(), 2);
}
