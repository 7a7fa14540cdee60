//! `/api/admin` handlers. Every call requires the admin role, checked in
//! the services.

use std::sync::Arc;

use axum::{extract::State, Json};
use guitartab_common::song::ModerationItem;
use guitartab_common::user::{ActivationChanged, RoleChanged, RoleUpdate, SystemStats, UserListQuery, UserView};
use guitartab_common::{ApiMessage, Page, PageQuery, Role};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::authz;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::services::{songs, users};
use crate::AppState;

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<Json<Page<UserView>>, AppError> {
    Ok(Json(users::list_users(&state, &user.subject(), query).await?))
}

pub async fn set_role(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<RoleUpdate>,
) -> Result<Json<ApiMessage<RoleChanged>>, AppError> {
    let changed = users::set_role(&state, &user.subject(), user_id, req).await?;
    let message = format!("User {} is now {}", changed.username, changed.new_role);
    Ok(Json(ApiMessage::with_data(message, changed)))
}

async fn change_role(
    state: &AppState,
    user: &CurrentUser,
    user_id: Uuid,
    role: Role,
) -> Result<Json<ApiMessage<RoleChanged>>, AppError> {
    let req = RoleUpdate {
        role: role.as_str().to_string(),
    };
    let changed = users::set_role(state, &user.subject(), user_id, req).await?;
    let message = format!("User {} is now {}", changed.username, changed.new_role);
    Ok(Json(ApiMessage::with_data(message, changed)))
}

pub async fn promote(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<ApiMessage<RoleChanged>>, AppError> {
    change_role(&state, &user, user_id, Role::Moderator).await
}

pub async fn demote(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<ApiMessage<RoleChanged>>, AppError> {
    change_role(&state, &user, user_id, Role::User).await
}

pub async fn activate(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<ApiMessage<ActivationChanged>>, AppError> {
    let changed = users::set_active(&state, &user.subject(), user_id, true).await?;
    let message = format!("User {} activated", changed.username);
    Ok(Json(ApiMessage::with_data(message, changed)))
}

pub async fn deactivate(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<ApiMessage<ActivationChanged>>, AppError> {
    let changed = users::set_active(&state, &user.subject(), user_id, false).await?;
    let message = format!("User {} deactivated", changed.username);
    Ok(Json(ApiMessage::with_data(message, changed)))
}

pub async fn system_stats(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<SystemStats>, AppError> {
    Ok(Json(users::system_stats(&state, &user.subject()).await?))
}

pub async fn moderation(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Page<ModerationItem>>, AppError> {
    let subject = user.subject();
    authz::require(authz::can_administer(&subject), "view the moderation queue")?;
    Ok(Json(songs::moderation_queue(&state, &subject, query.page, query.per_page).await?))
}
