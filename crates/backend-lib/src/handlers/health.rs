//! Liveness probe and API banner.

use axum::Json;
use guitartab_common::Health;
use serde_json::{json, Value};

pub const SERVICE_NAME: &str = "guitartab-pro";

pub async fn health() -> Json<Health> {
    Json(Health {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

/// `GET /api`
pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "GuitarTab Pro API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/auth",
            "songs": "/api/songs",
            "songlists": "/api/songlists",
            "users": "/api/users",
            "admin": "/api/admin",
            "health": "/health",
        },
    }))
}
