//! Route table.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::handlers::{admin, auth, health, songlists, songs, users};
use crate::middleware::rate_limit;
use crate::AppState;

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.settings.cors_origins);

    Router::new()
        .route("/health", get(health::health))
        .route("/api", get(health::index))
        .nest("/api/auth", auth_routes())
        .route("/api/songs/", get(songs::list).post(songs::create))
        .nest("/api/songs", song_routes())
        .nest("/api/songlists", songlist_routes())
        .nest("/api/users", user_routes())
        .nest("/api/admin", admin_routes())
        .layer(from_fn_with_state(state.clone(), rate_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/change-password", post(auth::change_password))
        .route("/me", get(auth::me).put(auth::update_me))
}

fn song_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(songs::list).post(songs::create))
        .route("/popular", get(songs::popular))
        .route("/top-rated", get(songs::top_rated))
        .route("/recent", get(songs::recent))
        .route("/filter-options", get(songs::filter_options))
        .route("/advanced-search", post(songs::advanced_search))
        .route("/bulk-update", put(songs::bulk_update))
        .route("/bulk-delete", delete(songs::bulk_delete))
        .route(
            "/moderation",
            get(songs::moderation_queue)
                .post(songs::approve)
                .delete(songs::reject),
        )
        .route("/{id}", get(songs::get).put(songs::update).delete(songs::delete))
        .route("/{id}/rate", post(songs::rate))
        .route("/{id}/flag", post(songs::flag))
        .route("/{id}/feature", post(songs::feature).delete(songs::unfeature))
}

fn songlist_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(songlists::list).post(songlists::create))
        .route(
            "/{id}",
            get(songlists::get).put(songlists::update).delete(songlists::delete),
        )
        .route("/{id}/songs", post(songlists::add_song))
        .route(
            "/{id}/songs/{song_id}",
            put(songlists::update_song).delete(songlists::remove_song),
        )
}

fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me/preferences", get(users::preferences).put(users::update_preferences))
        .route("/{id}/stats", get(users::stats))
}

fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}/role", put(admin::set_role))
        .route("/users/{id}/activate", post(admin::activate).delete(admin::deactivate))
        .route("/users/{id}/promote", post(admin::promote).delete(admin::demote))
        .route("/users/{id}/stats", get(users::stats))
        .route("/system/stats", get(admin::system_stats))
        .route("/moderation", get(admin::moderation))
}

/// Any origin when none are configured; otherwise only the listed ones,
/// with credentials so the auth cookies are sent
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            },
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
