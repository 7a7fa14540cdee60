//! SQLite persistence.
//!
//! The schema is created idempotently on startup. Ids are UUIDs and
//! timestamps are UTC; both are bound from Rust rather than generated by
//! SQLite.

pub mod models;
pub mod preferences;
pub mod songlists;
pub mod songs;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite, SqlitePool};
use tracing::info;

/// Open (creating if needed) the database and make sure the schema exists
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;
    info!(database_url, "database ready");
    Ok(pool)
}

/// Create every table and index that does not exist yet
pub async fn init_schema(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    create_users_table(pool).await?;
    create_songs_table(pool).await?;
    create_songlists_table(pool).await?;
    create_songlist_songs_table(pool).await?;
    create_user_preferences_table(pool).await?;
    Ok(())
}

/// Whether `err` is a UNIQUE / PRIMARY KEY constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|e| e.is_unique_violation())
}

async fn create_users_table(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BLOB PRIMARY KEY NOT NULL,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'moderator', 'admin')),
            is_active INTEGER NOT NULL DEFAULT 1,
            is_verified INTEGER NOT NULL DEFAULT 0,
            first_name TEXT,
            last_name TEXT,
            bio TEXT,
            avatar_url TEXT,
            website_url TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_login_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_songs_table(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id BLOB PRIMARY KEY NOT NULL,
            user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            artist TEXT NOT NULL,
            album TEXT,
            lyrics TEXT,
            chords TEXT,
            tab TEXT,
            genre TEXT,
            year INTEGER,
            musical_key TEXT,
            tempo INTEGER CHECK (tempo IS NULL OR tempo BETWEEN 20 AND 300),
            capo_position INTEGER CHECK (capo_position IS NULL OR capo_position BETWEEN 0 AND 12),
            difficulty INTEGER NOT NULL DEFAULT 1 CHECK (difficulty BETWEEN 1 AND 5),
            source_url TEXT,
            is_public INTEGER NOT NULL DEFAULT 1,
            is_featured INTEGER NOT NULL DEFAULT 0,
            is_flagged INTEGER NOT NULL DEFAULT 0,
            flagged_reason TEXT,
            flagged_at TEXT,
            views INTEGER NOT NULL DEFAULT 0,
            rating REAL NOT NULL DEFAULT 0,
            rating_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            moderated_at TEXT,
            moderated_by BLOB REFERENCES users(id) ON DELETE SET NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    for index in [
        "CREATE INDEX IF NOT EXISTS idx_songs_user ON songs(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_songs_visibility ON songs(is_public, is_flagged)",
        "CREATE INDEX IF NOT EXISTS idx_songs_created ON songs(created_at)",
        "CREATE INDEX IF NOT EXISTS idx_songs_genre ON songs(genre)",
        "CREATE INDEX IF NOT EXISTS idx_songs_artist ON songs(artist)",
    ] {
        sqlx::query(index).execute(pool).await?;
    }

    Ok(())
}

async fn create_songlists_table(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songlists (
            id BLOB PRIMARY KEY NOT NULL,
            user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT,
            is_public INTEGER NOT NULL DEFAULT 0,
            is_shared INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_songlists_user ON songlists(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_songlist_songs_table(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songlist_songs (
            songlist_id BLOB NOT NULL REFERENCES songlists(id) ON DELETE CASCADE,
            song_id BLOB NOT NULL REFERENCES songs(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            notes TEXT,
            added_at TEXT NOT NULL,
            PRIMARY KEY (songlist_id, song_id),
            UNIQUE (songlist_id, position)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_songlist_songs_song ON songlist_songs(song_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_user_preferences_table(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_preferences (
            user_id BLOB PRIMARY KEY NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            chord_color TEXT NOT NULL,
            lyric_color TEXT NOT NULL,
            background_color TEXT NOT NULL,
            title_color TEXT NOT NULL,
            font_size INTEGER NOT NULL,
            font_family TEXT NOT NULL,
            auto_scroll_speed INTEGER NOT NULL,
            auto_scroll_enabled INTEGER NOT NULL,
            metronome_enabled INTEGER NOT NULL,
            metronome_volume INTEGER NOT NULL,
            metronome_tempo INTEGER NOT NULL,
            display_mode TEXT NOT NULL,
            show_capo INTEGER NOT NULL,
            show_key INTEGER NOT NULL,
            show_tempo INTEGER NOT NULL,
            show_difficulty INTEGER NOT NULL,
            metronome_settings TEXT NOT NULL DEFAULT '{}',
            display_settings TEXT NOT NULL DEFAULT '{}',
            keyboard_shortcuts TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
