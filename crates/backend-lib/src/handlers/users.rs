//! `/api/users` handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use guitartab_common::user::{Preferences, PreferencesChanges, UserStats};
use guitartab_common::ApiMessage;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::services::users;
use crate::AppState;

pub async fn preferences(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Preferences>, AppError> {
    Ok(Json(users::preferences(&state, user.id).await?))
}

pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(changes): ApiJson<PreferencesChanges>,
) -> Result<Json<ApiMessage<Preferences>>, AppError> {
    let prefs = users::update_preferences(&state, user.id, changes).await?;
    Ok(Json(ApiMessage::with_data("Preferences updated successfully", prefs)))
}

/// Own statistics, or anyone's for admins
pub async fn stats(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<UserStats>, AppError> {
    Ok(Json(users::user_stats(&state, &user.subject(), user_id).await?))
}
