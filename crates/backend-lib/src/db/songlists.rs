//! Queries on `songlists` and their `songlist_songs` entries.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::models::{DbSonglist, DbSonglistEntry};
use crate::authz::{push_song_visibility, Subject};
use crate::pagination::PageRequest;

const SELECT_SONGLIST: &str = r#"
    SELECT l.id, l.user_id, l.name, l.description, l.is_public, l.is_shared,
           (SELECT COUNT(*) FROM songlist_songs e WHERE e.songlist_id = l.id) AS song_count,
           l.created_at, l.updated_at
    FROM songlists l
"#;

pub async fn insert<'e, E: SqliteExecutor<'e>>(exec: E, list: &DbSonglist) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO songlists (id, user_id, name, description, is_public, is_shared, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(list.id)
    .bind(list.user_id)
    .bind(&list.name)
    .bind(&list.description)
    .bind(list.is_public)
    .bind(list.is_shared)
    .bind(list.created_at)
    .bind(list.updated_at)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn find<'e, E: SqliteExecutor<'e>>(exec: E, id: Uuid) -> Result<Option<DbSonglist>, sqlx::Error> {
    sqlx::query_as::<_, DbSonglist>(&format!("{SELECT_SONGLIST} WHERE l.id = ?"))
        .bind(id)
        .fetch_optional(exec)
        .await
}

/// The owner's songlists, most recently updated first
pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: Uuid,
    page: PageRequest,
) -> Result<(Vec<DbSonglist>, u64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songlists WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    let lists = sqlx::query_as::<_, DbSonglist>(&format!(
        "{SELECT_SONGLIST} WHERE l.user_id = ? ORDER BY l.updated_at DESC, l.id DESC LIMIT ? OFFSET ?"
    ))
    .bind(user_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((lists, u64::try_from(total).unwrap_or(0)))
}

pub async fn update<'e, E: SqliteExecutor<'e>>(exec: E, list: &DbSonglist) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE songlists SET name = ?, description = ?, is_public = ?, is_shared = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&list.name)
    .bind(&list.description)
    .bind(list.is_public)
    .bind(list.is_shared)
    .bind(list.updated_at)
    .bind(list.id)
    .execute(exec)
    .await?;
    Ok(())
}

/// Entries cascade with the list
pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM songlists WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn touch<'e, E: SqliteExecutor<'e>>(exec: E, id: Uuid, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE songlists SET updated_at = ? WHERE id = ?")
        .bind(at)
        .bind(id)
        .execute(exec)
        .await?;
    Ok(())
}

/// Entries in position order joined with their songs, limited to the songs
/// `subject` may see
pub async fn entries(
    pool: &SqlitePool,
    songlist_id: Uuid,
    subject: Option<&Subject>,
) -> Result<Vec<DbSonglistEntry>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT e.song_id, e.position, e.notes, e.added_at,
               s.title, s.artist, s.genre, s.difficulty, s.rating, s.views, s.is_public
        FROM songlist_songs e
        JOIN songs s ON s.id = e.song_id
        WHERE e.songlist_id = "#,
    );
    qb.push_bind(songlist_id);
    push_song_visibility(&mut qb, subject, "s");
    qb.push(" ORDER BY e.position ASC");
    qb.build_query_as::<DbSonglistEntry>().fetch_all(pool).await
}

pub async fn find_entry(
    pool: &SqlitePool,
    songlist_id: Uuid,
    song_id: Uuid,
) -> Result<Option<DbSonglistEntry>, sqlx::Error> {
    sqlx::query_as::<_, DbSonglistEntry>(
        r#"
        SELECT e.song_id, e.position, e.notes, e.added_at,
               s.title, s.artist, s.genre, s.difficulty, s.rating, s.views, s.is_public
        FROM songlist_songs e
        JOIN songs s ON s.id = e.song_id
        WHERE e.songlist_id = ? AND e.song_id = ?
        "#,
    )
    .bind(songlist_id)
    .bind(song_id)
    .fetch_optional(pool)
    .await
}

/// Add a song. Without a position it goes after the current last entry.
/// A duplicate song or an occupied position surfaces as a unique violation.
pub async fn add_entry(
    pool: &SqlitePool,
    songlist_id: Uuid,
    song_id: Uuid,
    position: Option<i32>,
    notes: Option<&str>,
) -> Result<i32, sqlx::Error> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let position = match position {
        Some(p) => p,
        None => {
            let max: Option<i32> =
                sqlx::query_scalar("SELECT MAX(position) FROM songlist_songs WHERE songlist_id = ?")
                    .bind(songlist_id)
                    .fetch_one(&mut *tx)
                    .await?;
            max.unwrap_or(0) + 1
        },
    };

    sqlx::query(
        "INSERT INTO songlist_songs (songlist_id, song_id, position, notes, added_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(songlist_id)
    .bind(song_id)
    .bind(position)
    .bind(notes)
    .bind(now)
    .execute(&mut *tx)
    .await?;
    touch(&mut *tx, songlist_id, now).await?;

    tx.commit().await?;
    Ok(position)
}

/// Rewrite position and notes of an entry; `false` if it does not exist
pub async fn update_entry(
    pool: &SqlitePool,
    songlist_id: Uuid,
    song_id: Uuid,
    position: i32,
    notes: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        "UPDATE songlist_songs SET position = ?, notes = ? WHERE songlist_id = ? AND song_id = ?",
    )
    .bind(position)
    .bind(notes)
    .bind(songlist_id)
    .bind(song_id)
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
        return Ok(false);
    }
    touch(&mut *tx, songlist_id, now).await?;
    tx.commit().await?;
    Ok(true)
}

pub async fn remove_entry(pool: &SqlitePool, songlist_id: Uuid, song_id: Uuid) -> Result<bool, sqlx::Error> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;
    let result = sqlx::query("DELETE FROM songlist_songs WHERE songlist_id = ? AND song_id = ?")
        .bind(songlist_id)
        .bind(song_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Ok(false);
    }
    touch(&mut *tx, songlist_id, now).await?;
    tx.commit().await?;
    Ok(true)
}
