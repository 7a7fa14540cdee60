//! `/api/songlists` handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use guitartab_common::songlist::{
    AddSongRequest, EntryChanges, NewSonglist, SonglistChanges, SonglistDetail, SonglistEntryView, SonglistView,
};
use guitartab_common::{ApiMessage, Page, PageQuery};
use uuid::Uuid;

use crate::auth::{CurrentUser, MaybeUser};
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::services::songlists;
use crate::AppState;

pub async fn list(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Page<SonglistView>>, AppError> {
    Ok(Json(songlists::list_own(&state, &user.subject(), query).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(req): ApiJson<NewSonglist>,
) -> Result<(StatusCode, Json<ApiMessage<SonglistView>>), AppError> {
    let list = songlists::create(&state, &user.subject(), req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiMessage::with_data("Songlist created successfully", list)),
    ))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<SonglistDetail>, AppError> {
    Ok(Json(songlists::detail(&state, user.subject().as_ref(), id).await?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(changes): ApiJson<SonglistChanges>,
) -> Result<Json<ApiMessage<SonglistView>>, AppError> {
    let list = songlists::update(&state, &user.subject(), id, changes).await?;
    Ok(Json(ApiMessage::with_data("Songlist updated successfully", list)))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiMessage<()>>, AppError> {
    songlists::delete(&state, &user.subject(), id).await?;
    Ok(Json(ApiMessage::text("Songlist deleted successfully")))
}

pub async fn add_song(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<AddSongRequest>,
) -> Result<(StatusCode, Json<ApiMessage<SonglistEntryView>>), AppError> {
    let entry = songlists::add_song(&state, &user.subject(), id, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiMessage::with_data("Song added to songlist", entry)),
    ))
}

pub async fn update_song(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiPath((id, song_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(changes): ApiJson<EntryChanges>,
) -> Result<Json<ApiMessage<SonglistEntryView>>, AppError> {
    let entry = songlists::update_song(&state, &user.subject(), id, song_id, changes).await?;
    Ok(Json(ApiMessage::with_data("Songlist entry updated", entry)))
}

pub async fn remove_song(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiPath((id, song_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<ApiMessage<()>>, AppError> {
    songlists::remove_song(&state, &user.subject(), id, song_id).await?;
    Ok(Json(ApiMessage::text("Song removed from songlist")))
}
