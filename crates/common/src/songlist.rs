//! Songlist request and response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::song::SongSummary;

/// Songlist without its entries
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SonglistView {
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

/// Songlist with its entries ordered by position
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SonglistDetail {
    #[serde(flatten)]
    pub songlist: SonglistView,
    pub entries: Vec<SonglistEntryView>,
}

/// One song inside a songlist
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SonglistEntryView {
    pub song_id: Uuid,
    pub position: i32,
    pub notes: Option<String>,
    pub added_at: DateTime<Utc>,
    pub song: SongSummary,
}

/// Body of `POST /api/songlists`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NewSonglist {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub is_shared: Option<bool>,
}

/// Body of `PUT /api/songlists/{id}`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SonglistChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub is_shared: Option<bool>,
}

/// Body of `POST /api/songlists/{id}/songs`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AddSongRequest {
    pub song_id: Uuid,
    /// Defaults to one past the current last position
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body of `PUT /api/songlists/{id}/songs/{song_id}`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EntryChanges {
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}
