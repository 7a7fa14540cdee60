//! `/api/songs` handlers, including moderation and bulk operations.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use guitartab_common::song::{
    AdvancedSearch, BulkDelete, BulkDeleteResult, BulkUpdate, BulkUpdateResult, FilterOptions, FlagRequest,
    ModerationItem, ModerationRequest, NewSong, RateRequest, RatingSummary, SongChanges, SongQuery, SongView,
    TopListQuery,
};
use guitartab_common::{ApiMessage, Page, PageQuery};
use uuid::Uuid;

use crate::auth::{CurrentUser, MaybeUser};
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::services::songs;
use crate::AppState;

type Message<T> = Json<ApiMessage<T>>;

pub async fn list(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
    ApiQuery(query): ApiQuery<SongQuery>,
) -> Result<Json<Page<SongView>>, AppError> {
    Ok(Json(songs::list(&state, user.subject().as_ref(), query).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(req): ApiJson<NewSong>,
) -> Result<(StatusCode, Message<SongView>), AppError> {
    let song = songs::create(&state, &user.subject(), req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiMessage::with_data("Song created successfully", song)),
    ))
}

/// Counts as a view
pub async fn get(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<SongView>, AppError> {
    Ok(Json(songs::view(&state, user.subject().as_ref(), id).await?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(changes): ApiJson<SongChanges>,
) -> Result<Message<SongView>, AppError> {
    let song = songs::update(&state, &user.subject(), id, changes).await?;
    Ok(Json(ApiMessage::with_data("Song updated successfully", song)))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Message<()>, AppError> {
    songs::delete(&state, &user.subject(), id).await?;
    Ok(Json(ApiMessage::text("Song deleted successfully")))
}

pub async fn rate(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<RateRequest>,
) -> Result<Message<RatingSummary>, AppError> {
    let summary = songs::rate(&state, &user.subject(), id, req.rating).await?;
    Ok(Json(ApiMessage::with_data("Rating submitted", summary)))
}

pub async fn flag(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<FlagRequest>,
) -> Result<Message<SongView>, AppError> {
    let song = songs::flag(&state, &user.subject(), id, req.reason).await?;
    Ok(Json(ApiMessage::with_data("Song flagged for review", song)))
}

pub async fn feature(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Message<SongView>, AppError> {
    let song = songs::set_featured(&state, &user.subject(), id, true).await?;
    Ok(Json(ApiMessage::with_data("Song featured", song)))
}

pub async fn unfeature(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Message<SongView>, AppError> {
    let song = songs::set_featured(&state, &user.subject(), id, false).await?;
    Ok(Json(ApiMessage::with_data("Song unfeatured", song)))
}

pub async fn popular(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<TopListQuery>,
) -> Result<Json<Vec<SongView>>, AppError> {
    Ok(Json(songs::popular(&state, query.limit).await?))
}

pub async fn top_rated(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<TopListQuery>,
) -> Result<Json<Vec<SongView>>, AppError> {
    Ok(Json(songs::top_rated(&state, query.limit).await?))
}

pub async fn recent(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<TopListQuery>,
) -> Result<Json<Vec<SongView>>, AppError> {
    Ok(Json(songs::recent(&state, query.limit).await?))
}

pub async fn filter_options(State(state): State<Arc<AppState>>) -> Result<Json<FilterOptions>, AppError> {
    Ok(Json(songs::filter_options(&state).await?))
}

pub async fn advanced_search(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
    ApiJson(search): ApiJson<AdvancedSearch>,
) -> Result<Json<Page<SongView>>, AppError> {
    Ok(Json(songs::advanced_search(&state, user.subject().as_ref(), search).await?))
}

pub async fn bulk_update(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(req): ApiJson<BulkUpdate>,
) -> Result<Message<BulkUpdateResult>, AppError> {
    let result = songs::bulk_update(&state, &user.subject(), req).await?;
    let message = format!("Updated {} songs", result.updated.len());
    Ok(Json(ApiMessage::with_data(message, result)))
}

pub async fn bulk_delete(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(req): ApiJson<BulkDelete>,
) -> Result<Message<BulkDeleteResult>, AppError> {
    let result = songs::bulk_delete(&state, &user.subject(), req).await?;
    let message = format!("Deleted {} songs", result.deleted);
    Ok(Json(ApiMessage::with_data(message, result)))
}

pub async fn moderation_queue(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Page<ModerationItem>>, AppError> {
    let page = songs::moderation_queue(&state, &user.subject(), query.page, query.per_page).await?;
    Ok(Json(page))
}

pub async fn approve(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(req): ApiJson<ModerationRequest>,
) -> Result<Message<SongView>, AppError> {
    let song = songs::approve(&state, &user.subject(), req.song_id).await?;
    Ok(Json(ApiMessage::with_data("Song approved", song)))
}

pub async fn reject(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(req): ApiJson<ModerationRequest>,
) -> Result<Message<()>, AppError> {
    songs::reject(&state, &user.subject(), req.song_id).await?;
    Ok(Json(ApiMessage::text("Song rejected and removed")))
}
