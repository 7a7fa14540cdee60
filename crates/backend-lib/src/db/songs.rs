//! Queries on the `songs` table.

use chrono::{DateTime, Utc};
use guitartab_common::song::FilterOptions;
use guitartab_common::user::{ContentCounts, Engagement, SongCounts};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::models::{DbModerationItem, DbSong};
use crate::authz::{push_song_visibility, Subject};
use crate::pagination::{PageRequest, Sort};

/// Listing filters shared by the plain listing and advanced search
#[derive(Debug, Clone, Default)]
pub struct SongFilter {
    /// Substring of title, artist or album
    pub text: Option<String>,
    /// Also match `text` against lyrics
    pub text_in_lyrics: bool,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Any-of substring match on genre
    pub genres: Vec<String>,
    pub difficulty_min: Option<i32>,
    pub difficulty_max: Option<i32>,
    /// Allowed difficulty levels; empty means any
    pub difficulties: Vec<i32>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub rating_min: Option<f64>,
    pub rating_max: Option<f64>,
    pub user_id: Option<Uuid>,
    pub is_public: Option<bool>,
    pub has_lyrics: Option<bool>,
    pub has_chords: Option<bool>,
    pub has_tab: Option<bool>,
    pub has_rating: Option<bool>,
}

/// Per-user song numbers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserSongCounts {
    pub total: i64,
    pub public: i64,
    pub flagged: i64,
    pub views: i64,
}

/// `%term%` with LIKE wildcards in `term` escaped by `\`
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

pub async fn insert<'e, E: SqliteExecutor<'e>>(exec: E, song: &DbSong) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO songs (
            id, user_id, title, artist, album, lyrics, chords, tab, genre, year,
            musical_key, tempo, capo_position, difficulty, source_url,
            is_public, is_featured, is_flagged, flagged_reason, flagged_at,
            views, rating, rating_count, created_at, updated_at, moderated_at, moderated_by
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(song.id)
    .bind(song.user_id)
    .bind(&song.title)
    .bind(&song.artist)
    .bind(&song.album)
    .bind(&song.lyrics)
    .bind(&song.chords)
    .bind(&song.tab)
    .bind(&song.genre)
    .bind(song.year)
    .bind(&song.musical_key)
    .bind(song.tempo)
    .bind(song.capo_position)
    .bind(song.difficulty)
    .bind(&song.source_url)
    .bind(song.is_public)
    .bind(song.is_featured)
    .bind(song.is_flagged)
    .bind(&song.flagged_reason)
    .bind(song.flagged_at)
    .bind(song.views)
    .bind(song.rating)
    .bind(song.rating_count)
    .bind(song.created_at)
    .bind(song.updated_at)
    .bind(song.moderated_at)
    .bind(song.moderated_by)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn find<'e, E: SqliteExecutor<'e>>(exec: E, id: Uuid) -> Result<Option<DbSong>, sqlx::Error> {
    sqlx::query_as::<_, DbSong>("SELECT * FROM songs WHERE id = ?")
        .bind(id)
        .fetch_optional(exec)
        .await
}

/// Write the editable columns of `song`. Engagement counters are left
/// alone so concurrent views and ratings are not overwritten.
pub async fn update<'e, E: SqliteExecutor<'e>>(exec: E, song: &DbSong) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE songs SET
            title = ?, artist = ?, album = ?, lyrics = ?, chords = ?, tab = ?,
            genre = ?, year = ?, musical_key = ?, tempo = ?, capo_position = ?,
            difficulty = ?, source_url = ?, is_public = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&song.title)
    .bind(&song.artist)
    .bind(&song.album)
    .bind(&song.lyrics)
    .bind(&song.chords)
    .bind(&song.tab)
    .bind(&song.genre)
    .bind(song.year)
    .bind(&song.musical_key)
    .bind(song.tempo)
    .bind(song.capo_position)
    .bind(song.difficulty)
    .bind(&song.source_url)
    .bind(song.is_public)
    .bind(song.updated_at)
    .bind(song.id)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn delete<'e, E: SqliteExecutor<'e>>(exec: E, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM songs WHERE id = ?")
        .bind(id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Bump the view counter and return the new value
pub async fn increment_views(pool: &SqlitePool, id: Uuid) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("UPDATE songs SET views = views + 1 WHERE id = ? RETURNING views")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Fold one rating into the running mean in a single statement, so
/// concurrent raters cannot lose updates. Returns `(rating, rating_count)`.
pub async fn add_rating(pool: &SqlitePool, id: Uuid, rating: f64) -> Result<Option<(f64, i64)>, sqlx::Error> {
    sqlx::query_as(
        r#"
        UPDATE songs
        SET rating = (rating * rating_count + ?) / (rating_count + 1),
            rating_count = rating_count + 1
        WHERE id = ?
        RETURNING rating, rating_count
        "#,
    )
    .bind(rating)
    .bind(id)
    .fetch_optional(pool)
    .await
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &SongFilter, subject: Option<&Subject>) {
    qb.push(" WHERE 1 = 1");
    push_song_visibility(qb, subject, "s");

    if let Some(text) = filter.text.as_deref().filter(|t| !t.is_empty()) {
        let pattern = like_pattern(text);
        qb.push(" AND (s.title LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR s.artist LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR s.album LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\'");
        if filter.text_in_lyrics {
            qb.push(" OR s.lyrics LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\'");
        }
        qb.push(")");
    }
    if let Some(artist) = filter.artist.as_deref().filter(|t| !t.is_empty()) {
        qb.push(" AND s.artist LIKE ")
            .push_bind(like_pattern(artist))
            .push(" ESCAPE '\\'");
    }
    if let Some(album) = filter.album.as_deref().filter(|t| !t.is_empty()) {
        qb.push(" AND s.album LIKE ")
            .push_bind(like_pattern(album))
            .push(" ESCAPE '\\'");
    }
    if !filter.genres.is_empty() {
        qb.push(" AND (");
        let mut sep = qb.separated(" OR ");
        for genre in &filter.genres {
            sep.push("s.genre LIKE ")
                .push_bind_unseparated(like_pattern(genre))
                .push_unseparated(" ESCAPE '\\'");
        }
        qb.push(")");
    }
    if let Some(min) = filter.difficulty_min {
        qb.push(" AND s.difficulty >= ").push_bind(min);
    }
    if let Some(max) = filter.difficulty_max {
        qb.push(" AND s.difficulty <= ").push_bind(max);
    }
    if !filter.difficulties.is_empty() {
        qb.push(" AND s.difficulty IN (");
        let mut sep = qb.separated(", ");
        for level in &filter.difficulties {
            sep.push_bind(*level);
        }
        qb.push(")");
    }
    if let Some(from) = filter.year_from {
        qb.push(" AND s.year >= ").push_bind(from);
    }
    if let Some(to) = filter.year_to {
        qb.push(" AND s.year <= ").push_bind(to);
    }
    if let Some(min) = filter.rating_min {
        qb.push(" AND s.rating >= ").push_bind(min);
    }
    if let Some(max) = filter.rating_max {
        qb.push(" AND s.rating <= ").push_bind(max);
    }
    if let Some(user_id) = filter.user_id {
        qb.push(" AND s.user_id = ").push_bind(user_id);
    }
    if let Some(public) = filter.is_public {
        qb.push(" AND s.is_public = ").push_bind(public);
    }
    for (column, wanted) in [
        ("lyrics", filter.has_lyrics),
        ("chords", filter.has_chords),
        ("tab", filter.has_tab),
    ] {
        match wanted {
            Some(true) => {
                qb.push(format!(" AND (s.{column} IS NOT NULL AND s.{column} != '')"));
            },
            Some(false) => {
                qb.push(format!(" AND (s.{column} IS NULL OR s.{column} = '')"));
            },
            None => {},
        }
    }
    match filter.has_rating {
        Some(true) => {
            qb.push(" AND s.rating_count > 0");
        },
        Some(false) => {
            qb.push(" AND s.rating_count = 0");
        },
        None => {},
    }
}

/// One page of songs visible to `subject`, plus the visible total
pub async fn list(
    pool: &SqlitePool,
    filter: &SongFilter,
    subject: Option<&Subject>,
    sort: Sort,
    page: PageRequest,
) -> Result<(Vec<DbSong>, u64), sqlx::Error> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM songs s");
    push_filter(&mut count, filter, subject);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new("SELECT s.* FROM songs s");
    push_filter(&mut qb, filter, subject);
    qb.push(" ORDER BY ")
        .push(sort.order_by("s"))
        .push(" LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let songs = qb.build_query_as::<DbSong>().fetch_all(pool).await?;

    Ok((songs, u64::try_from(total).unwrap_or(0)))
}

/// Public, unflagged songs by views
pub async fn popular(pool: &SqlitePool, limit: i64) -> Result<Vec<DbSong>, sqlx::Error> {
    sqlx::query_as::<_, DbSong>(
        "SELECT * FROM songs WHERE is_public = 1 AND is_flagged = 0 ORDER BY views DESC, created_at DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Public, unflagged, rated songs by rating
pub async fn top_rated(pool: &SqlitePool, limit: i64) -> Result<Vec<DbSong>, sqlx::Error> {
    sqlx::query_as::<_, DbSong>(
        r#"
        SELECT * FROM songs
        WHERE is_public = 1 AND is_flagged = 0 AND rating > 0
        ORDER BY rating DESC, rating_count DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Public, unflagged songs, newest first
pub async fn recent(pool: &SqlitePool, limit: i64) -> Result<Vec<DbSong>, sqlx::Error> {
    sqlx::query_as::<_, DbSong>(
        "SELECT * FROM songs WHERE is_public = 1 AND is_flagged = 0 ORDER BY created_at DESC, id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

async fn distinct_text(pool: &SqlitePool, column: &str) -> Result<Vec<String>, sqlx::Error> {
    let sql = format!(
        "SELECT DISTINCT {column} FROM songs \
         WHERE is_public = 1 AND is_flagged = 0 AND {column} IS NOT NULL AND {column} != '' \
         ORDER BY {column}"
    );
    sqlx::query_scalar(&sql).fetch_all(pool).await
}

/// Distinct filter values among public, unflagged songs
pub async fn filter_options(pool: &SqlitePool) -> Result<FilterOptions, sqlx::Error> {
    let genres = distinct_text(pool, "genre").await?;
    let artists = distinct_text(pool, "artist").await?;
    let albums = distinct_text(pool, "album").await?;
    let years: Vec<i32> = sqlx::query_scalar(
        "SELECT DISTINCT year FROM songs WHERE is_public = 1 AND is_flagged = 0 AND year IS NOT NULL ORDER BY year DESC",
    )
    .fetch_all(pool)
    .await?;
    let difficulties: Vec<i32> = sqlx::query_scalar(
        "SELECT DISTINCT difficulty FROM songs WHERE is_public = 1 AND is_flagged = 0 ORDER BY difficulty",
    )
    .fetch_all(pool)
    .await?;

    Ok(FilterOptions {
        genres,
        artists,
        albums,
        years,
        difficulties,
    })
}

/// Mark a song flagged. `moderator` is recorded when staff raised the flag.
pub async fn flag(
    pool: &SqlitePool,
    id: Uuid,
    reason: &str,
    moderator: Option<Uuid>,
    at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE songs SET
            is_flagged = 1,
            flagged_reason = ?,
            flagged_at = ?,
            moderated_by = COALESCE(?, moderated_by),
            moderated_at = CASE WHEN ? IS NULL THEN moderated_at ELSE ? END
        WHERE id = ?
        "#,
    )
    .bind(reason)
    .bind(at)
    .bind(moderator)
    .bind(moderator)
    .bind(at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Clear the flag, publish the song and record who approved it
pub async fn approve(pool: &SqlitePool, id: Uuid, moderator: Uuid, at: DateTime<Utc>) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE songs SET
            is_flagged = 0,
            flagged_reason = NULL,
            flagged_at = NULL,
            is_public = 1,
            moderated_by = ?,
            moderated_at = ?
        WHERE id = ? AND is_flagged = 1
        "#,
    )
    .bind(moderator)
    .bind(at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_featured(pool: &SqlitePool, id: Uuid, featured: bool) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE songs SET is_featured = ?, updated_at = ? WHERE id = ?")
        .bind(featured)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Flagged songs with their uploader, oldest flag first
pub async fn list_flagged(pool: &SqlitePool, page: PageRequest) -> Result<(Vec<DbModerationItem>, u64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs WHERE is_flagged = 1")
        .fetch_one(pool)
        .await?;

    let items = sqlx::query_as::<_, DbModerationItem>(
        r#"
        SELECT s.id, s.title, s.artist, u.username AS uploader,
               s.flagged_reason, s.flagged_at, s.created_at
        FROM songs s
        JOIN users u ON u.id = s.user_id
        WHERE s.is_flagged = 1
        ORDER BY s.flagged_at ASC, s.id ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((items, u64::try_from(total).unwrap_or(0)))
}

pub async fn counts_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<UserSongCounts, sqlx::Error> {
    let (total, public, flagged, views): (i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*),
            COALESCE(SUM(is_public), 0),
            COALESCE(SUM(is_flagged), 0),
            COALESCE(SUM(views), 0)
        FROM songs WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(UserSongCounts {
        total,
        public,
        flagged,
        views,
    })
}

/// Song, content and engagement numbers for the system statistics
pub async fn system_counts(pool: &SqlitePool) -> Result<(SongCounts, ContentCounts, Engagement), sqlx::Error> {
    let row: (i64, i64, i64, i64, i64, i64, i64, i64, Option<f64>) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*),
            COALESCE(SUM(is_public), 0),
            COALESCE(SUM(is_flagged), 0),
            COALESCE(SUM(is_featured), 0),
            COALESCE(SUM(lyrics IS NOT NULL AND lyrics != ''), 0),
            COALESCE(SUM(chords IS NOT NULL AND chords != ''), 0),
            COALESCE(SUM(tab IS NOT NULL AND tab != ''), 0),
            COALESCE(SUM(views), 0),
            (SELECT AVG(rating) FROM songs WHERE rating_count > 0)
        FROM songs
        "#,
    )
    .fetch_one(pool)
    .await?;

    let average = row.8.map_or(0.0, |avg| (avg * 100.0).round() / 100.0);
    Ok((
        SongCounts {
            total: row.0,
            public: row.1,
            flagged: row.2,
            featured: row.3,
        },
        ContentCounts {
            with_lyrics: row.4,
            with_chords: row.5,
            with_tabs: row.6,
        },
        Engagement {
            total_views: row.7,
            average_rating: average,
        },
    ))
}
