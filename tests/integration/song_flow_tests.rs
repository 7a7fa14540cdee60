//! Song CRUD, visibility, rating, moderation and bulk operations over HTTP
use axum::http::{Method, StatusCode};
use guitartab_common::Role;
use serde_json::json;

use crate::test_utils::{song, TestApp};

#[tokio::test]
async fn test_health_and_banner() {
    let app = TestApp::new().await;
    let res = app.get("/health", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({ "status": "healthy", "service": "guitartab-pro" }));

    let res = app.get("/api", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["endpoints"]["songs"], "/api/songs");
}

#[tokio::test]
async fn test_create_requires_login_and_valid_body() {
    let app = TestApp::new().await;
    assert_eq!(
        app.post("/api/songs", None, song("Anon")).await.status,
        StatusCode::UNAUTHORIZED
    );

    let user = app.register_and_login("writer").await;
    let res = app
        .post(
            "/api/songs",
            Some(&user.token),
            json!({ "title": "  ", "artist": "Someone", "difficulty": 9 }),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.body["errors"]["title"].is_string());
    assert!(res.body["errors"]["difficulty"].is_string());

    let res = app
        .post(
            "/api/songs/",
            Some(&user.token),
            json!({ "title": "  Minor Swing ", "artist": "Django", "genre": "Jazz", "chords": "Am  Dm\nE7" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let created = &res.body["data"];
    assert_eq!(created["title"], "Minor Swing");
    assert_eq!(created["difficulty"], 1);
    assert_eq!(created["is_public"], true);
    assert_eq!(created["chords"], "Am  Dm\nE7");
    assert_eq!(created["user_id"], user.id.to_string());
}

#[tokio::test]
async fn test_edit_and_delete_permissions() {
    let app = TestApp::new().await;
    let owner = app.register_and_login("owner").await;
    let other = app.register_and_login("other").await;
    let moderator = app.user_with_role("modder", Role::Moderator).await;
    let admin = app.user_with_role("boss", Role::Admin).await;
    let id = app.create_song(&owner.token, song("Mine")).await;
    let uri = format!("/api/songs/{id}");

    let change = json!({ "title": "Stolen" });
    assert_eq!(app.put(&uri, Some(&other.token), change.clone()).await.status, StatusCode::FORBIDDEN);
    // Moderators only edit flagged or private songs
    assert_eq!(app.put(&uri, Some(&moderator.token), change).await.status, StatusCode::FORBIDDEN);

    let res = app.put(&uri, Some(&owner.token), json!({ "title": "Still Mine", "year": 1937 })).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["title"], "Still Mine");
    assert_eq!(res.body["data"]["year"], 1937);

    assert_eq!(app.delete(&uri, Some(&other.token)).await.status, StatusCode::FORBIDDEN);
    assert_eq!(app.delete(&uri, Some(&admin.token)).await.status, StatusCode::OK);
    assert_eq!(app.get(&uri, None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_private_song_visibility_and_views() {
    let app = TestApp::new().await;
    let owner = app.register_and_login("shy").await;
    let other = app.register_and_login("nosy").await;
    let id = app
        .create_song(&owner.token, json!({ "title": "Secret", "artist": "Me", "is_public": false }))
        .await;
    let uri = format!("/api/songs/{id}");

    assert_eq!(app.get(&uri, None).await.status, StatusCode::FORBIDDEN);
    assert_eq!(app.get(&uri, Some(&other.token)).await.status, StatusCode::FORBIDDEN);

    let first = app.get(&uri, Some(&owner.token)).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["views"], 1);
    let second = app.get(&uri, Some(&owner.token)).await;
    assert_eq!(second.body["views"], 2);

    let listed = app.get("/api/songs", None).await;
    assert_eq!(listed.body["pagination"]["total"], 0);
    let listed = app.get("/api/songs", Some(&owner.token)).await;
    assert_eq!(listed.body["pagination"]["total"], 1);

    assert_eq!(
        app.get("/api/songs/not-a-uuid", None).await.status,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_pagination() {
    let app = TestApp::new().await;
    let user = app.register_and_login("prolific").await;
    for i in 0..25 {
        app.create_song(&user.token, song(&format!("Song {i:02}"))).await;
    }

    let res = app.get("/api/songs?per_page=10&page=3&sort_by=title&sort_order=asc", None).await;
    assert_eq!(res.status, StatusCode::OK);
    let page = &res.body["pagination"];
    assert_eq!(page["total"], 25);
    assert_eq!(page["pages"], 3);
    assert_eq!(page["has_next"], false);
    assert_eq!(page["has_prev"], true);
    assert_eq!(page["prev_page"], 2);
    let items = res.body["items"].as_array().unwrap();
    assert_eq!(items.len(), 5);
    assert_eq!(items[0]["title"], "Song 20");

    let res = app.get("/api/songs", None).await;
    assert_eq!(res.body["pagination"]["per_page"], 25);
    assert_eq!(res.body["pagination"]["pages"], 1);

    let res = app.get("/api/songs?per_page=1000", None).await;
    assert_eq!(res.body["pagination"]["per_page"], 100);

    let res = app.get("/api/songs?sort_by=password", None).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_search_and_filters() {
    let app = TestApp::new().await;
    let user = app.register_and_login("curator").await;
    app.create_song(
        &user.token,
        json!({ "title": "Wonderwall", "artist": "Oasis", "genre": "Rock", "difficulty": 2, "year": 1995 }),
    )
    .await;
    app.create_song(
        &user.token,
        json!({ "title": "Blackbird", "artist": "The Beatles", "genre": "Folk", "difficulty": 4, "year": 1968,
                "lyrics": "Blackbird singing in the dead of night" }),
    )
    .await;
    app.create_song(
        &user.token,
        json!({ "title": "100% Pure", "artist": "Percent", "genre": "Rock", "difficulty": 3 }),
    )
    .await;

    let total = |res: &crate::test_utils::TestResponse| res.body["pagination"]["total"].as_u64().unwrap();

    assert_eq!(total(&app.get("/api/songs?search=beatles", None).await), 1);
    assert_eq!(total(&app.get("/api/songs?genre=Rock", None).await), 2);
    assert_eq!(total(&app.get("/api/songs?difficulty_min=3", None).await), 2);
    assert_eq!(total(&app.get("/api/songs?year_from=1990&year_to=2000", None).await), 1);
    // LIKE wildcards are matched literally
    assert_eq!(total(&app.get("/api/songs?search=%25", None).await), 1);

    let res = app
        .post(
            "/api/songs/advanced-search",
            None,
            json!({ "query": "dead of night", "genre": ["Folk", "Jazz"], "has_lyrics": true }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(total(&res), 1);
    assert_eq!(res.body["items"][0]["title"], "Blackbird");

    let res = app
        .post("/api/songs/advanced-search", None, json!({ "difficulty_range": [2, 3] }))
        .await;
    assert_eq!(total(&res), 2);

    let options = app.get("/api/songs/filter-options", None).await;
    assert_eq!(options.status, StatusCode::OK);
    assert_eq!(options.body["genres"], json!(["Folk", "Rock"]));
    assert_eq!(options.body["years"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_rating_is_running_mean() {
    let app = TestApp::new().await;
    let owner = app.register_and_login("rated").await;
    let fan = app.register_and_login("fan").await;
    let id = app.create_song(&owner.token, song("Rate Me")).await;
    let uri = format!("/api/songs/{id}/rate");

    assert_eq!(
        app.post(&uri, None, json!({ "rating": 5 })).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.post(&uri, Some(&fan.token), json!({ "rating": 6 })).await.status,
        StatusCode::UNPROCESSABLE_ENTITY
    );

    app.post(&uri, Some(&fan.token), json!({ "rating": 5 })).await;
    let res = app.post(&uri, Some(&owner.token), json!({ "rating": 4 })).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["rating"], 4.5);
    assert_eq!(res.body["data"]["rating_count"], 2);

    let top = app.get("/api/songs/top-rated?limit=5", None).await;
    assert_eq!(top.body[0]["id"], id.to_string());
}

#[tokio::test]
async fn test_popular_and_recent() {
    let app = TestApp::new().await;
    let user = app.register_and_login("charts").await;
    let quiet = app.create_song(&user.token, song("Quiet")).await;
    let hit = app.create_song(&user.token, song("Hit")).await;
    for _ in 0..3 {
        app.get(&format!("/api/songs/{hit}"), None).await;
    }
    app.get(&format!("/api/songs/{quiet}"), None).await;

    let popular = app.get("/api/songs/popular", None).await;
    assert_eq!(popular.status, StatusCode::OK);
    assert_eq!(popular.body[0]["id"], hit.to_string());
    assert_eq!(popular.body[0]["views"], 3);

    let recent = app.get("/api/songs/recent?limit=1", None).await;
    assert_eq!(recent.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_flag_and_moderation_queue() {
    let app = TestApp::new().await;
    let owner = app.register_and_login("uploader").await;
    let reporter = app.register_and_login("reporter").await;
    let moderator = app.user_with_role("referee", Role::Moderator).await;
    let keep = app.create_song(&owner.token, song("Keep")).await;
    let drop = app.create_song(&owner.token, song("Drop")).await;

    for id in [keep, drop] {
        let res = app
            .post(
                &format!("/api/songs/{id}/flag"),
                Some(&reporter.token),
                json!({ "reason": "Wrong chords" }),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["data"]["is_flagged"], true);
    }

    // Flagged songs leave the public listing but stay visible to their owner
    assert_eq!(app.get("/api/songs", None).await.body["pagination"]["total"], 0);
    assert_eq!(
        app.get(&format!("/api/songs/{keep}"), Some(&owner.token)).await.status,
        StatusCode::OK
    );

    assert_eq!(
        app.get("/api/songs/moderation", Some(&reporter.token)).await.status,
        StatusCode::FORBIDDEN
    );
    let queue = app.get("/api/songs/moderation", Some(&moderator.token)).await;
    assert_eq!(queue.status, StatusCode::OK);
    assert_eq!(queue.body["pagination"]["total"], 2);
    assert_eq!(queue.body["items"][0]["uploader"], "uploader");
    assert_eq!(queue.body["items"][0]["flagged_reason"], "Wrong chords");

    let res = app
        .post("/api/songs/moderation", Some(&moderator.token), json!({ "song_id": keep }))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["is_flagged"], false);
    assert_eq!(res.body["data"]["moderated_by"], moderator.id.to_string());

    let res = app
        .request(
            Method::DELETE,
            "/api/songs/moderation",
            Some(&moderator.token),
            Some(json!({ "song_id": drop })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(app.get(&format!("/api/songs/{drop}"), None).await.status, StatusCode::NOT_FOUND);

    assert_eq!(app.get("/api/songs", None).await.body["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_moderation_leaves_unflagged_songs_alone() {
    let app = TestApp::new().await;
    let owner = app.register_and_login("drafter").await;
    let moderator = app.user_with_role("overreach", Role::Moderator).await;
    let draft = app
        .create_song(&owner.token, json!({ "title": "Secret Demo", "artist": "A", "is_public": false }))
        .await;
    let public = app.create_song(&owner.token, song("Released")).await;

    for id in [draft, public] {
        let res = app
            .post("/api/songs/moderation", Some(&moderator.token), json!({ "song_id": id }))
            .await;
        assert_eq!(res.status, StatusCode::CONFLICT);

        let res = app
            .request(
                Method::DELETE,
                "/api/songs/moderation",
                Some(&moderator.token),
                Some(json!({ "song_id": id })),
            )
            .await;
        assert_eq!(res.status, StatusCode::CONFLICT);
    }

    // The draft stays private and both songs survive
    assert_eq!(app.get(&format!("/api/songs/{draft}"), None).await.status, StatusCode::FORBIDDEN);
    assert_eq!(app.get(&format!("/api/songs/{draft}"), Some(&owner.token)).await.status, StatusCode::OK);
    assert_eq!(app.get(&format!("/api/songs/{public}"), None).await.status, StatusCode::OK);

    let res = app
        .post("/api/songs/moderation", Some(&moderator.token), json!({ "song_id": uuid::Uuid::new_v4() }))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feature_is_admin_only() {
    let app = TestApp::new().await;
    let owner = app.register_and_login("featured").await;
    let admin = app.user_with_role("chief", Role::Admin).await;
    let id = app.create_song(&owner.token, song("Star")).await;
    let uri = format!("/api/songs/{id}/feature");

    assert_eq!(
        app.request(Method::POST, &uri, Some(&owner.token), None).await.status,
        StatusCode::FORBIDDEN
    );
    let res = app.request(Method::POST, &uri, Some(&admin.token), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["is_featured"], true);

    let res = app.delete(&uri, Some(&admin.token)).await;
    assert_eq!(res.body["data"]["is_featured"], false);
}

#[tokio::test]
async fn test_bulk_update_and_delete() {
    let app = TestApp::new().await;
    let owner = app.register_and_login("bulky").await;
    let other = app.register_and_login("bystander").await;
    let a = app.create_song(&owner.token, song("A")).await;
    let b = app.create_song(&owner.token, song("B")).await;
    let foreign = app.create_song(&other.token, song("Foreign")).await;

    let res = app
        .put(
            "/api/songs/bulk-update",
            Some(&owner.token),
            json!({ "songs": [
                { "id": a, "genre": "Blues" },
                { "id": b, "difficulty": 0 },
                { "id": foreign, "genre": "Blues" },
            ] }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let data = &res.body["data"];
    assert_eq!(data["updated"].as_array().unwrap().len(), 1);
    assert_eq!(data["updated"][0]["genre"], "Blues");
    assert_eq!(data["skipped"], json!([b, foreign]));

    let res = app
        .request(
            Method::DELETE,
            "/api/songs/bulk-delete",
            Some(&owner.token),
            Some(json!({ "ids": [a, b, foreign] })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["deleted"], 2);
    assert_eq!(res.body["data"]["skipped"], json!([foreign]));

    let too_many: Vec<_> = (0..101).map(|_| uuid::Uuid::new_v4()).collect();
    let res = app
        .request(
            Method::DELETE,
            "/api/songs/bulk-delete",
            Some(&owner.token),
            Some(json!({ "ids": too_many })),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
}
