//! Songlists and their ordered entries.

use chrono::Utc;
use guitartab_common::songlist::{
    AddSongRequest, EntryChanges, NewSonglist, SonglistChanges, SonglistDetail, SonglistEntryView, SonglistView,
};
use guitartab_common::{Page, PageQuery};
use tracing::info;
use uuid::Uuid;

use crate::authz::{self, Subject};
use crate::db::models::{DbSonglist, DbSonglistEntry};
use crate::db::{self, is_unique_violation, songlists as store};
use crate::error::AppError;
use crate::pagination::PageRequest;
use crate::validation::{self, normalize};
use crate::AppState;

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Songlist {id} not found"))
}

async fn load(state: &AppState, id: Uuid) -> Result<DbSonglist, AppError> {
    store::find(&state.db, id).await?.ok_or_else(|| not_found(id))
}

/// Load a list the subject may modify
async fn load_for_change(state: &AppState, subject: &Subject, id: Uuid) -> Result<DbSonglist, AppError> {
    let list = load(state, id).await?;
    authz::require(authz::can_modify_songlist(subject, &list.access()), "modify this songlist")?;
    Ok(list)
}

pub async fn list_own(state: &AppState, subject: &Subject, query: PageQuery) -> Result<Page<SonglistView>, AppError> {
    let p = &state.settings.pagination;
    let page = PageRequest::new(query.page, query.per_page, p.default_per_page, p.max_per_page);
    let (lists, total) = store::list_for_user(&state.db, subject.id, page).await?;
    Ok(page.wrap(lists.into_iter().map(DbSonglist::into_view).collect(), total))
}

pub async fn create(state: &AppState, owner: &Subject, req: NewSonglist) -> Result<SonglistView, AppError> {
    let req = NewSonglist {
        name: req.name.trim().to_string(),
        description: normalize(req.description),
        ..req
    };
    validation::validate_new_songlist(&req)?;

    let now = Utc::now();
    let list = DbSonglist {
        id: Uuid::new_v4(),
        user_id: owner.id,
        name: req.name,
        description: req.description,
        is_public: req.is_public.unwrap_or(false),
        is_shared: req.is_shared.unwrap_or(false),
        song_count: 0,
        created_at: now,
        updated_at: now,
    };
    store::insert(&state.db, &list).await?;

    info!(songlist_id = %list.id, user_id = %owner.id, "songlist created");
    Ok(list.into_view())
}

/// A songlist with its entries in position order
pub async fn detail(state: &AppState, subject: Option<&Subject>, id: Uuid) -> Result<SonglistDetail, AppError> {
    let list = load(state, id).await?;
    authz::require(authz::can_view_songlist(subject, &list.access()), "view this songlist")?;

    let entries = store::entries(&state.db, id, subject)
        .await?
        .into_iter()
        .map(SonglistEntryView::from)
        .collect();
    Ok(SonglistDetail {
        songlist: list.into_view(),
        entries,
    })
}

pub async fn update(
    state: &AppState,
    subject: &Subject,
    id: Uuid,
    changes: SonglistChanges,
) -> Result<SonglistView, AppError> {
    let changes = SonglistChanges {
        name: changes.name.map(|n| n.trim().to_string()),
        description: changes.description.map(|d| d.trim().to_string()),
        ..changes
    };
    validation::validate_songlist_changes(&changes)?;

    let mut list = load_for_change(state, subject, id).await?;
    if let Some(name) = changes.name {
        list.name = name;
    }
    if changes.description.is_some() {
        list.description = normalize(changes.description);
    }
    if let Some(public) = changes.is_public {
        list.is_public = public;
    }
    if let Some(shared) = changes.is_shared {
        list.is_shared = shared;
    }
    list.updated_at = Utc::now();
    store::update(&state.db, &list).await?;

    Ok(list.into_view())
}

pub async fn delete(state: &AppState, subject: &Subject, id: Uuid) -> Result<(), AppError> {
    load_for_change(state, subject, id).await?;
    store::delete(&state.db, id).await?;
    info!(songlist_id = %id, user_id = %subject.id, "songlist deleted");
    Ok(())
}

fn entry_conflict(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict("Song is already in the songlist or the position is taken".to_string())
    } else {
        AppError::Database(err)
    }
}

/// Add a visible song to the list
pub async fn add_song(
    state: &AppState,
    subject: &Subject,
    id: Uuid,
    req: AddSongRequest,
) -> Result<SonglistEntryView, AppError> {
    let notes = normalize(req.notes);
    validation::validate_entry(req.position, notes.as_deref())?;

    load_for_change(state, subject, id).await?;
    let song = db::songs::find(&state.db, req.song_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Song {} not found", req.song_id)))?;
    authz::require(authz::can_view_song(Some(subject), &song.access()), "add this song")?;

    store::add_entry(&state.db, id, req.song_id, req.position, notes.as_deref())
        .await
        .map_err(entry_conflict)?;
    entry(state, id, req.song_id).await
}

async fn entry(state: &AppState, id: Uuid, song_id: Uuid) -> Result<SonglistEntryView, AppError> {
    store::find_entry(&state.db, id, song_id)
        .await?
        .map(SonglistEntryView::from)
        .ok_or_else(|| AppError::NotFound(format!("Song {song_id} is not in songlist {id}")))
}

pub async fn update_song(
    state: &AppState,
    subject: &Subject,
    id: Uuid,
    song_id: Uuid,
    changes: EntryChanges,
) -> Result<SonglistEntryView, AppError> {
    let notes = changes.notes.map(|n| n.trim().to_string());
    validation::validate_entry(changes.position, notes.as_deref())?;

    load_for_change(state, subject, id).await?;
    let current: DbSonglistEntry = store::find_entry(&state.db, id, song_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Song {song_id} is not in songlist {id}")))?;

    let position = changes.position.unwrap_or(current.position);
    let notes = match notes {
        Some(n) => normalize(Some(n)),
        None => current.notes,
    };
    store::update_entry(&state.db, id, song_id, position, notes.as_deref())
        .await
        .map_err(entry_conflict)?;
    entry(state, id, song_id).await
}

pub async fn remove_song(state: &AppState, subject: &Subject, id: Uuid, song_id: Uuid) -> Result<(), AppError> {
    load_for_change(state, subject, id).await?;
    if !store::remove_entry(&state.db, id, song_id).await? {
        return Err(AppError::NotFound(format!("Song {song_id} is not in songlist {id}")));
    }
    Ok(())
}
