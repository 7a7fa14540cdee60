//! Song operations: CRUD, listing and search, engagement and moderation.

use chrono::Utc;
use guitartab_common::song::{
    AdvancedSearch, BulkDelete, BulkDeleteResult, BulkUpdate, BulkUpdateResult, FilterOptions,
    ModerationItem, NewSong, RatingSummary, SongChanges, SongQuery, SongView,
};
use guitartab_common::Page;
use tracing::{info, warn};
use uuid::Uuid;

use crate::authz::{self, Subject};
use crate::db::models::DbSong;
use crate::db::songs::{self as store, SongFilter};
use crate::error::AppError;
use crate::pagination::{clamp_limit, PageRequest, Sort};
use crate::validation::{self, normalize, ValidationError};
use crate::{metrics, AppState};

/// Most entries a single bulk request may carry
pub const MAX_BULK_ITEMS: usize = 100;

/// Content keeps its whitespace; only blank content is dropped
fn content(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Song {id} not found"))
}

async fn load(state: &AppState, id: Uuid) -> Result<DbSong, AppError> {
    store::find(&state.db, id).await?.ok_or_else(|| not_found(id))
}

pub async fn create(state: &AppState, owner: &Subject, req: NewSong) -> Result<SongView, AppError> {
    let req = NewSong {
        title: req.title.trim().to_string(),
        artist: req.artist.trim().to_string(),
        album: normalize(req.album),
        lyrics: content(req.lyrics),
        chords: content(req.chords),
        tab: content(req.tab),
        genre: normalize(req.genre),
        musical_key: normalize(req.musical_key),
        source_url: normalize(req.source_url),
        ..req
    };
    validation::validate_new_song(&req)?;

    let now = Utc::now();
    let song = DbSong {
        id: Uuid::new_v4(),
        user_id: owner.id,
        title: req.title,
        artist: req.artist,
        album: req.album,
        lyrics: req.lyrics,
        chords: req.chords,
        tab: req.tab,
        genre: req.genre,
        year: req.year,
        musical_key: req.musical_key,
        tempo: req.tempo,
        capo_position: req.capo_position,
        difficulty: req.difficulty.unwrap_or(1),
        source_url: req.source_url,
        is_public: req.is_public.unwrap_or(true),
        is_featured: false,
        is_flagged: false,
        flagged_reason: None,
        flagged_at: None,
        views: 0,
        rating: 0.0,
        rating_count: 0,
        created_at: now,
        updated_at: now,
        moderated_at: None,
        moderated_by: None,
    };
    store::insert(&state.db, &song).await?;

    ::metrics::counter!(metrics::SONG_CREATED).increment(1);
    info!(song_id = %song.id, user_id = %owner.id, title = %song.title, "song created");
    Ok(song.into_view())
}

/// Fetch a song for display and count the view
pub async fn view(state: &AppState, subject: Option<&Subject>, id: Uuid) -> Result<SongView, AppError> {
    let mut song = load(state, id).await?;
    authz::require(authz::can_view_song(subject, &song.access()), "view this song")?;

    if let Some(views) = store::increment_views(&state.db, id).await? {
        song.views = views;
    }
    ::metrics::counter!(metrics::SONG_VIEWED).increment(1);
    Ok(song.into_view())
}

/// Trim the changes the way [`create`] trims a new song. `Some("")` on an
/// optional field survives as `Some("")` so it clears the column.
fn trim_changes(changes: SongChanges) -> SongChanges {
    let trim = |v: Option<String>| v.map(|s| s.trim().to_string());
    SongChanges {
        title: trim(changes.title),
        artist: trim(changes.artist),
        album: trim(changes.album),
        genre: trim(changes.genre),
        musical_key: trim(changes.musical_key),
        source_url: trim(changes.source_url),
        ..changes
    }
}

fn apply_changes(song: &mut DbSong, changes: SongChanges) {
    if let Some(title) = changes.title {
        song.title = title;
    }
    if let Some(artist) = changes.artist {
        song.artist = artist;
    }
    if changes.album.is_some() {
        song.album = normalize(changes.album);
    }
    if changes.lyrics.is_some() {
        song.lyrics = content(changes.lyrics);
    }
    if changes.chords.is_some() {
        song.chords = content(changes.chords);
    }
    if changes.tab.is_some() {
        song.tab = content(changes.tab);
    }
    if changes.genre.is_some() {
        song.genre = normalize(changes.genre);
    }
    if changes.year.is_some() {
        song.year = changes.year;
    }
    if changes.musical_key.is_some() {
        song.musical_key = normalize(changes.musical_key);
    }
    if changes.tempo.is_some() {
        song.tempo = changes.tempo;
    }
    if changes.capo_position.is_some() {
        song.capo_position = changes.capo_position;
    }
    if let Some(difficulty) = changes.difficulty {
        song.difficulty = difficulty;
    }
    if changes.source_url.is_some() {
        song.source_url = normalize(changes.source_url);
    }
    if let Some(public) = changes.is_public {
        song.is_public = public;
    }
    song.updated_at = Utc::now();
}

/// Empty strings are only "clear this field", so they skip the length
/// checks of optional fields
fn validate_changes(changes: &SongChanges) -> Result<(), AppError> {
    let present = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
    let check = SongChanges {
        album: present(&changes.album),
        genre: present(&changes.genre),
        musical_key: present(&changes.musical_key),
        source_url: present(&changes.source_url),
        ..changes.clone()
    };
    validation::validate_song_changes(&check)?;
    Ok(())
}

pub async fn update(state: &AppState, subject: &Subject, id: Uuid, changes: SongChanges) -> Result<SongView, AppError> {
    let changes = trim_changes(changes);
    validate_changes(&changes)?;

    let mut song = load(state, id).await?;
    authz::require(authz::can_edit_song(subject, &song.access()), "edit this song")?;

    apply_changes(&mut song, changes);
    store::update(&state.db, &song).await?;

    info!(song_id = %id, user_id = %subject.id, "song updated");
    Ok(song.into_view())
}

pub async fn delete(state: &AppState, subject: &Subject, id: Uuid) -> Result<(), AppError> {
    let song = load(state, id).await?;
    authz::require(authz::can_delete_song(subject, &song.access()), "delete this song")?;

    store::delete(&state.db, id).await?;
    ::metrics::counter!(metrics::SONG_DELETED).increment(1);
    info!(song_id = %id, user_id = %subject.id, "song deleted");
    Ok(())
}

fn page_request(state: &AppState, page: Option<u32>, per_page: Option<u32>) -> PageRequest {
    let p = &state.settings.pagination;
    PageRequest::new(page, per_page, p.default_per_page, p.max_per_page)
}

/// Filtered, sorted page of the songs visible to `subject`
pub async fn list(state: &AppState, subject: Option<&Subject>, query: SongQuery) -> Result<Page<SongView>, AppError> {
    validation::validate_song_query(&query)?;
    let sort = Sort::parse(query.sort_by.as_deref(), query.sort_order.as_deref())?;
    let page = page_request(state, query.page, query.per_page);

    let filter = SongFilter {
        text: normalize(query.search),
        genres: normalize(query.genre).into_iter().collect(),
        difficulty_min: query.difficulty_min,
        difficulty_max: query.difficulty_max,
        year_from: query.year_from,
        year_to: query.year_to,
        rating_min: query.rating_min,
        rating_max: query.rating_max,
        user_id: query.user_id,
        is_public: query.is_public,
        ..SongFilter::default()
    };

    let (songs, total) = store::list(&state.db, &filter, subject, sort, page).await?;
    Ok(page.wrap(songs.into_iter().map(DbSong::into_view).collect(), total))
}

pub async fn advanced_search(
    state: &AppState,
    subject: Option<&Subject>,
    search: AdvancedSearch,
) -> Result<Page<SongView>, AppError> {
    validation::validate_advanced_search(&search)?;
    let sort = Sort::parse(search.sort_by.as_deref(), search.sort_order.as_deref())?;
    let page = page_request(state, search.page, search.per_page);

    let filter = SongFilter {
        text: normalize(search.query),
        text_in_lyrics: true,
        artist: normalize(search.artist),
        album: normalize(search.album),
        genres: search
            .genre
            .unwrap_or_default()
            .into_iter()
            .filter_map(|g| normalize(Some(g)))
            .collect(),
        difficulties: search.difficulty_range.unwrap_or_default(),
        year_from: search.year_from,
        year_to: search.year_to,
        rating_min: search.rating_min,
        rating_max: search.rating_max,
        is_public: search.is_public,
        has_lyrics: search.has_lyrics,
        has_chords: search.has_chords,
        has_tab: search.has_tab,
        has_rating: search.has_rating,
        ..SongFilter::default()
    };

    let (songs, total) = store::list(&state.db, &filter, subject, sort, page).await?;
    Ok(page.wrap(songs.into_iter().map(DbSong::into_view).collect(), total))
}

fn views(songs: Vec<DbSong>) -> Vec<SongView> {
    songs.into_iter().map(DbSong::into_view).collect()
}

pub async fn popular(state: &AppState, limit: Option<u32>) -> Result<Vec<SongView>, AppError> {
    Ok(views(store::popular(&state.db, clamp_limit(limit)).await?))
}

pub async fn top_rated(state: &AppState, limit: Option<u32>) -> Result<Vec<SongView>, AppError> {
    Ok(views(store::top_rated(&state.db, clamp_limit(limit)).await?))
}

pub async fn recent(state: &AppState, limit: Option<u32>) -> Result<Vec<SongView>, AppError> {
    Ok(views(store::recent(&state.db, clamp_limit(limit)).await?))
}

pub async fn filter_options(state: &AppState) -> Result<FilterOptions, AppError> {
    Ok(store::filter_options(&state.db).await?)
}

/// Fold a rating into the song's mean
pub async fn rate(state: &AppState, subject: &Subject, id: Uuid, rating: f64) -> Result<RatingSummary, AppError> {
    validation::validate_rating("rating", rating)?;
    let song = load(state, id).await?;
    authz::require(authz::can_view_song(Some(subject), &song.access()), "rate this song")?;

    let (rating, rating_count) = store::add_rating(&state.db, id, rating)
        .await?
        .ok_or_else(|| not_found(id))?;

    ::metrics::counter!(metrics::SONG_RATED).increment(1);
    Ok(RatingSummary {
        song_id: id,
        rating,
        rating_count,
    })
}

/// Report a song. Flags raised by staff count as a moderation action.
pub async fn flag(state: &AppState, subject: &Subject, id: Uuid, reason: String) -> Result<SongView, AppError> {
    let reason = reason.trim().to_string();
    validation::validate_flag_reason(&reason)?;

    let song = load(state, id).await?;
    authz::require(authz::can_view_song(Some(subject), &song.access()), "flag this song")?;

    let moderator = subject.is_staff().then_some(subject.id);
    store::flag(&state.db, id, &reason, moderator, Utc::now()).await?;

    ::metrics::counter!(metrics::SONG_FLAGGED).increment(1);
    info!(song_id = %id, user_id = %subject.id, %reason, "song flagged");
    Ok(load(state, id).await?.into_view())
}

fn not_flagged(id: Uuid) -> AppError {
    AppError::Conflict(format!("Song {id} is not awaiting moderation"))
}

/// Approve and reject only act on flagged songs
fn awaiting_moderation(song: &DbSong) -> Result<(), AppError> {
    if song.is_flagged {
        Ok(())
    } else {
        Err(not_flagged(song.id))
    }
}

pub async fn moderation_queue(
    state: &AppState,
    subject: &Subject,
    page: Option<u32>,
    per_page: Option<u32>,
) -> Result<Page<ModerationItem>, AppError> {
    authz::require(authz::can_moderate(subject), "moderate songs")?;
    let page = page_request(state, page, per_page);
    let (items, total) = store::list_flagged(&state.db, page).await?;
    Ok(page.wrap(items.into_iter().map(ModerationItem::from).collect(), total))
}

/// Clear the flag and publish
pub async fn approve(state: &AppState, subject: &Subject, id: Uuid) -> Result<SongView, AppError> {
    authz::require(authz::can_moderate(subject), "moderate songs")?;
    awaiting_moderation(&load(state, id).await?)?;
    if !store::approve(&state.db, id, subject.id, Utc::now()).await? {
        return Err(not_flagged(id));
    }
    info!(song_id = %id, moderator = %subject.id, "song approved");
    Ok(load(state, id).await?.into_view())
}

/// Remove a reported song
pub async fn reject(state: &AppState, subject: &Subject, id: Uuid) -> Result<(), AppError> {
    authz::require(authz::can_moderate(subject), "moderate songs")?;
    let song = load(state, id).await?;
    awaiting_moderation(&song)?;
    authz::require(authz::can_delete_song(subject, &song.access()), "delete this song")?;
    if !store::delete(&state.db, id).await? {
        return Err(not_found(id));
    }
    ::metrics::counter!(metrics::SONG_DELETED).increment(1);
    info!(song_id = %id, moderator = %subject.id, "song rejected");
    Ok(())
}

pub async fn set_featured(state: &AppState, subject: &Subject, id: Uuid, featured: bool) -> Result<SongView, AppError> {
    authz::require(authz::can_administer(subject), "feature songs")?;
    if !store::set_featured(&state.db, id, featured).await? {
        return Err(not_found(id));
    }
    info!(song_id = %id, featured, "song featured flag changed");
    Ok(load(state, id).await?.into_view())
}

fn check_bulk_size(field: &'static str, len: usize) -> Result<(), AppError> {
    if len > MAX_BULK_ITEMS {
        return Err(ValidationError::invalid(field, format!("At most {MAX_BULK_ITEMS} entries per request")).into());
    }
    Ok(())
}

/// Apply every entry the caller may edit; the rest are reported as skipped
pub async fn bulk_update(state: &AppState, subject: &Subject, req: BulkUpdate) -> Result<BulkUpdateResult, AppError> {
    check_bulk_size("songs", req.songs.len())?;

    let mut result = BulkUpdateResult::default();
    let mut tx = state.db.begin().await?;
    for entry in req.songs {
        let changes = trim_changes(entry.changes);
        if validate_changes(&changes).is_err() {
            result.skipped.push(entry.id);
            continue;
        }
        let Some(mut song) = store::find(&mut *tx, entry.id).await? else {
            result.skipped.push(entry.id);
            continue;
        };
        if !authz::can_edit_song(subject, &song.access()) {
            result.skipped.push(entry.id);
            continue;
        }
        apply_changes(&mut song, changes);
        store::update(&mut *tx, &song).await?;
        result.updated.push(song.into_view());
    }
    tx.commit().await?;

    if !result.skipped.is_empty() {
        warn!(user_id = %subject.id, skipped = result.skipped.len(), "bulk update skipped songs");
    }
    info!(user_id = %subject.id, updated = result.updated.len(), "bulk update");
    Ok(result)
}

/// Delete every listed song the caller may delete
pub async fn bulk_delete(state: &AppState, subject: &Subject, req: BulkDelete) -> Result<BulkDeleteResult, AppError> {
    check_bulk_size("ids", req.ids.len())?;

    let mut result = BulkDeleteResult::default();
    let mut tx = state.db.begin().await?;
    for id in req.ids {
        let allowed = match store::find(&mut *tx, id).await? {
            Some(song) => authz::can_delete_song(subject, &song.access()),
            None => false,
        };
        if allowed && store::delete(&mut *tx, id).await? {
            result.deleted += 1;
        } else {
            result.skipped.push(id);
        }
    }
    tx.commit().await?;

    ::metrics::counter!(metrics::SONG_DELETED).increment(result.deleted);
    info!(user_id = %subject.id, deleted = result.deleted, skipped = result.skipped.len(), "bulk delete");
    Ok(result)
}
