//! Song request and response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Full song representation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SongView {
    pub id: Uuid,
    /// Creator of the song
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
    /// 1 (easiest) to 5
    pub difficulty: i32,
    pub source_url: Option<String>,
    pub is_public: bool,
    pub is_featured: bool,
    pub is_flagged: bool,
    pub flagged_reason: Option<String>,
    pub views: i64,
    /// Running mean of all submitted ratings
    pub rating: f64,
    pub rating_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub moderated_by: Option<Uuid>,
}

/// Compact song representation used inside songlists
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SongSummary {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub genre: Option<String>,
    pub difficulty: i32,
    pub rating: f64,
    pub views: i64,
    pub is_public: bool,
}

/// Body of `POST /api/songs`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub chords: Option<String>,
    #[serde(default)]
    pub tab: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub musical_key: Option<String>,
    #[serde(default)]
    pub tempo: Option<i32>,
    #[serde(default)]
    pub capo_position: Option<i32>,
    /// Defaults to 1
    #[serde(default)]
    pub difficulty: Option<i32>,
    #[serde(default)]
    pub source_url: Option<String>,
    /// Defaults to public
    #[serde(default)]
    pub is_public: Option<bool>,
}

/// Partial update of a song. Absent fields are left untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SongChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chords: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub musical_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capo_position: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl SongChanges {
    /// True when the update would not modify anything
    pub fn is_empty(&self) -> bool {
        *self == SongChanges::default()
    }
}

/// Query string of `GET /api/songs`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SongQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    /// Case-insensitive substring of title, artist or album
    pub search: Option<String>,
    pub genre: Option<String>,
    pub difficulty_min: Option<i32>,
    pub difficulty_max: Option<i32>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub rating_min: Option<f64>,
    pub rating_max: Option<f64>,
    /// Restrict to songs created by this user
    pub user_id: Option<Uuid>,
    pub is_public: Option<bool>,
}

fn default_public_only() -> Option<bool> {
    Some(true)
}

/// Body of `POST /api/songs/advanced-search`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AdvancedSearch {
    /// Matched against title, artist, album and lyrics
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    /// Any-of match on genre
    #[serde(default)]
    pub genre: Option<Vec<String>>,
    #[serde(default)]
    pub year_from: Option<i32>,
    #[serde(default)]
    pub year_to: Option<i32>,
    /// Allowed difficulty levels
    #[serde(default)]
    pub difficulty_range: Option<Vec<i32>>,
    #[serde(default)]
    pub rating_min: Option<f64>,
    #[serde(default)]
    pub rating_max: Option<f64>,
    #[serde(default)]
    pub has_lyrics: Option<bool>,
    #[serde(default)]
    pub has_chords: Option<bool>,
    #[serde(default)]
    pub has_tab: Option<bool>,
    #[serde(default)]
    pub has_rating: Option<bool>,
    #[serde(default = "default_public_only")]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
}

impl Default for AdvancedSearch {
    fn default() -> Self {
        Self {
            query: None,
            artist: None,
            album: None,
            genre: None,
            year_from: None,
            year_to: None,
            difficulty_range: None,
            rating_min: None,
            rating_max: None,
            has_lyrics: None,
            has_chords: None,
            has_tab: None,
            has_rating: None,
            is_public: default_public_only(),
            page: None,
            per_page: None,
            sort_by: None,
            sort_order: None,
        }
    }
}

/// Query string of the popular / top-rated / recent listings
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TopListQuery {
    pub limit: Option<u32>,
}

/// Body of `POST /api/songs/{id}/rate`
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct RateRequest {
    pub rating: f64,
}

/// Aggregate rating after a submission
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RatingSummary {
    pub song_id: Uuid,
    pub rating: f64,
    pub rating_count: i64,
}

/// Body of `POST /api/songs/{id}/flag`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FlagRequest {
    pub reason: String,
}

/// Body of the moderation approve / reject calls
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct ModerationRequest {
    pub song_id: Uuid,
}

/// One entry of a bulk update
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BulkSongChange {
    pub id: Uuid,
    #[serde(flatten)]
    pub changes: SongChanges,
}

/// Body of `PUT /api/songs/bulk-update`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BulkUpdate {
    pub songs: Vec<BulkSongChange>,
}

/// Result of a bulk update
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct BulkUpdateResult {
    pub updated: Vec<SongView>,
    /// Ids that were missing, not editable by the caller or invalid
    pub skipped: Vec<Uuid>,
}

/// Body of `DELETE /api/songs/bulk-delete`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct BulkDelete {
    pub ids: Vec<Uuid>,
}

/// Result of a bulk delete
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct BulkDeleteResult {
    pub deleted: u64,
    pub skipped: Vec<Uuid>,
}

/// Distinct values available for filtering
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub genres: Vec<String>,
    pub artists: Vec<String>,
    pub albums: Vec<String>,
    pub years: Vec<i32>,
    pub difficulties: Vec<i32>,
}

/// Flagged song awaiting review
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ModerationItem {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub uploader: String,
    pub flagged_reason: Option<String>,
    pub flagged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
