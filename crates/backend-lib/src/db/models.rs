//! Database models for persistent storage
//! These models map directly to SQLite tables

use chrono::{DateTime, Utc};
use guitartab_common::song::{ModerationItem, SongSummary, SongView};
use guitartab_common::songlist::{SonglistEntryView, SonglistView};
use guitartab_common::user::{DisplayMode, Preferences, UserView};
use guitartab_common::Role;
use sqlx::FromRow;
use uuid::Uuid;

use crate::authz::{SongAccess, SonglistAccess, Subject};

/// Account row
#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub username: String,
    /// Always stored lower-case
    pub email: String,
    /// scrypt PHC string
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl DbUser {
    /// The column has a CHECK constraint, so parsing only fails on a
    /// hand-edited database; such rows get the least privileged role.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_default()
    }

    pub fn subject(&self) -> Subject {
        Subject::new(self.id, self.role())
    }

    /// First and last name, whichever exist, else the username
    pub fn full_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.to_string(),
            (None, Some(last)) => last.to_string(),
            (None, None) => self.username.clone(),
        }
    }

    /// Upper-cased name initials, else the first two username characters
    pub fn initials(&self) -> String {
        let initials: String = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter_map(|name| name.chars().next())
            .flat_map(char::to_uppercase)
            .collect();
        if initials.is_empty() {
            self.username.chars().take(2).flat_map(char::to_uppercase).collect()
        } else {
            initials
        }
    }

    pub fn to_view(&self) -> UserView {
        UserView {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            full_name: self.full_name(),
            initials: self.initials(),
            role: self.role(),
            is_active: self.is_active,
            is_verified: self.is_verified,
            bio: self.bio.clone(),
            avatar_url: self.avatar_url.clone(),
            website_url: self.website_url.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_login_at: self.last_login_at,
        }
    }
}

/// Song row
#[derive(Debug, Clone, FromRow)]
pub struct DbSong {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub lyrics: Option<String>,
    pub chords: Option<String>,
    pub tab: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub musical_key: Option<String>,
    pub tempo: Option<i32>,
    pub capo_position: Option<i32>,
    pub difficulty: i32,
    pub source_url: Option<String>,
    pub is_public: bool,
    pub is_featured: bool,
    pub is_flagged: bool,
    pub flagged_reason: Option<String>,
    pub flagged_at: Option<DateTime<Utc>>,
    pub views: i64,
    pub rating: f64,
    pub rating_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub moderated_by: Option<Uuid>,
}

impl DbSong {
    pub fn access(&self) -> SongAccess {
        SongAccess {
            owner_id: self.user_id,
            is_public: self.is_public,
            is_flagged: self.is_flagged,
        }
    }

    pub fn into_view(self) -> SongView {
        SongView {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            artist: self.artist,
            album: self.album,
            lyrics: self.lyrics,
            chords: self.chords,
            tab: self.tab,
            genre: self.genre,
            year: self.year,
            musical_key: self.musical_key,
            tempo: self.tempo,
            capo_position: self.capo_position,
            difficulty: self.difficulty,
            source_url: self.source_url,
            is_public: self.is_public,
            is_featured: self.is_featured,
            is_flagged: self.is_flagged,
            flagged_reason: self.flagged_reason,
            views: self.views,
            rating: self.rating,
            rating_count: self.rating_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
            moderated_at: self.moderated_at,
            moderated_by: self.moderated_by,
        }
    }
}

/// Flagged song joined with its uploader
#[derive(Debug, Clone, FromRow)]
pub struct DbModerationItem {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub uploader: String,
    pub flagged_reason: Option<String>,
    pub flagged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<DbModerationItem> for ModerationItem {
    fn from(row: DbModerationItem) -> Self {
        ModerationItem {
            id: row.id,
            title: row.title,
            artist: row.artist,
            uploader: row.uploader,
            flagged_reason: row.flagged_reason,
            flagged_at: row.flagged_at,
            created_at: row.created_at,
        }
    }
}

/// Songlist row with its entry count
#[derive(Debug, Clone, FromRow)]
pub struct DbSonglist {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub is_shared: bool,
    pub song_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbSonglist {
    pub fn access(&self) -> SonglistAccess {
        SonglistAccess {
            owner_id: self.user_id,
            is_public: self.is_public,
            is_shared: self.is_shared,
        }
    }

    pub fn into_view(self) -> SonglistView {
        SonglistView {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            description: self.description,
            is_public: self.is_public,
            is_shared: self.is_shared,
            song_count: self.song_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Songlist membership joined with the song summary columns
#[derive(Debug, Clone, FromRow)]
pub struct DbSonglistEntry {
    pub song_id: Uuid,
    pub position: i32,
    pub notes: Option<String>,
    pub added_at: DateTime<Utc>,
    pub title: String,
    pub artist: String,
    pub genre: Option<String>,
    pub difficulty: i32,
    pub rating: f64,
    pub views: i64,
    pub is_public: bool,
}

impl From<DbSonglistEntry> for SonglistEntryView {
    fn from(row: DbSonglistEntry) -> Self {
        SonglistEntryView {
            song_id: row.song_id,
            position: row.position,
            notes: row.notes,
            added_at: row.added_at,
            song: SongSummary {
                id: row.song_id,
                title: row.title,
                artist: row.artist,
                genre: row.genre,
                difficulty: row.difficulty,
                rating: row.rating,
                views: row.views,
                is_public: row.is_public,
            },
        }
    }
}

/// Preferences row; JSON columns are stored as text
#[derive(Debug, Clone, FromRow)]
pub struct DbPreferences {
    pub user_id: Uuid,
    pub chord_color: String,
    pub lyric_color: String,
    pub background_color: String,
    pub title_color: String,
    pub font_size: i32,
    pub font_family: String,
    pub auto_scroll_speed: i32,
    pub auto_scroll_enabled: bool,
    pub metronome_enabled: bool,
    pub metronome_volume: i32,
    pub metronome_tempo: i32,
    pub display_mode: String,
    pub show_capo: bool,
    pub show_key: bool,
    pub show_tempo: bool,
    pub show_difficulty: bool,
    pub metronome_settings: String,
    pub display_settings: String,
    pub keyboard_shortcuts: String,
}

fn json_object(text: &str) -> serde_json::Value {
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::json!({}))
}

impl From<DbPreferences> for Preferences {
    fn from(row: DbPreferences) -> Self {
        Preferences {
            chord_color: row.chord_color,
            lyric_color: row.lyric_color,
            background_color: row.background_color,
            title_color: row.title_color,
            font_size: row.font_size,
            font_family: row.font_family,
            auto_scroll_speed: row.auto_scroll_speed,
            auto_scroll_enabled: row.auto_scroll_enabled,
            metronome_enabled: row.metronome_enabled,
            metronome_volume: row.metronome_volume,
            metronome_tempo: row.metronome_tempo,
            display_mode: DisplayMode::parse(&row.display_mode).unwrap_or_default(),
            show_capo: row.show_capo,
            show_key: row.show_key,
            show_tempo: row.show_tempo,
            show_difficulty: row.show_difficulty,
            metronome_settings: json_object(&row.metronome_settings),
            display_settings: json_object(&row.display_settings),
            keyboard_shortcuts: json_object(&row.keyboard_shortcuts),
        }
    }
}
