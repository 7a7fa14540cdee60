//! Authentication, user and preference bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Role;

/// Body of `POST /api/auth/register`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Body of `POST /api/auth/login`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    #[serde(alias = "username", alias = "email")]
    pub username_or_email: String,
    pub password: String,
}

/// Body of `POST /api/auth/refresh` when the token is not sent as header or cookie
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Body of `POST /api/auth/change-password`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Tokens handed out by login and refresh
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Always `"Bearer"`
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
}

/// Public representation of an account
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: String,
    pub initials: String,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Body of `PUT /api/auth/me`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ProfileChanges {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
}

/// Body of `PUT /api/admin/users/{id}/role`. Kept as a string so an unknown
/// role is reported as a validation error rather than a malformed body.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RoleUpdate {
    pub role: String,
}

/// Result of a role change
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RoleChanged {
    pub user_id: Uuid,
    pub username: String,
    pub new_role: Role,
}

/// Result of activation / deactivation
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ActivationChanged {
    pub username: String,
    pub is_active: bool,
}

/// Query string of `GET /api/admin/users`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Substring of username, email, first or last name
    pub search: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// Per-user content statistics
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserStats {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub is_active: bool,
    pub total_songs: i64,
    pub public_songs: i64,
    pub flagged_songs: i64,
    pub total_views: i64,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// System wide statistics
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SystemStats {
    pub users: UserCounts,
    pub songs: SongCounts,
    pub content: ContentCounts,
    pub engagement: Engagement,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UserCounts {
    pub total: i64,
    pub active: i64,
    pub admins: i64,
    pub moderators: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SongCounts {
    pub total: i64,
    pub public: i64,
    pub flagged: i64,
    pub featured: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ContentCounts {
    pub with_lyrics: i64,
    pub with_chords: i64,
    pub with_tabs: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Engagement {
    pub total_views: i64,
    /// Mean rating of rated songs, rounded to two decimals
    pub average_rating: f64,
}

/// Chord sheet layout
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    ChordsAbove,
    ChordsInline,
    TabOnly,
}

impl DisplayMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayMode::ChordsAbove => "chords_above",
            DisplayMode::ChordsInline => "chords_inline",
            DisplayMode::TabOnly => "tab_only",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "chords_above" => Some(DisplayMode::ChordsAbove),
            "chords_inline" => Some(DisplayMode::ChordsInline),
            "tab_only" => Some(DisplayMode::TabOnly),
            _ => None,
        }
    }
}

/// Display and behaviour settings of one user
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Preferences {
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
    pub display_mode: DisplayMode,
    pub show_capo: bool,
    pub show_key: bool,
    pub show_tempo: bool,
    pub show_difficulty: bool,
    pub metronome_settings: serde_json::Value,
    pub display_settings: serde_json::Value,
    pub keyboard_shortcuts: serde_json::Value,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            chord_color: "#FF6B6B".to_string(),
            lyric_color: "#333333".to_string(),
            background_color: "#FFFFFF".to_string(),
            title_color: "#2C3E50".to_string(),
            font_size: 16,
            font_family: "Arial, sans-serif".to_string(),
            auto_scroll_speed: 50,
            auto_scroll_enabled: false,
            metronome_enabled: false,
            metronome_volume: 50,
            metronome_tempo: 120,
            display_mode: DisplayMode::ChordsAbove,
            show_capo: true,
            show_key: true,
            show_tempo: true,
            show_difficulty: true,
            metronome_settings: serde_json::json!({}),
            display_settings: serde_json::json!({}),
            keyboard_shortcuts: serde_json::json!({}),
        }
    }
}

/// Body of `PUT /api/users/me/preferences`; absent fields keep their value
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PreferencesChanges {
    #[serde(default)]
    pub chord_color: Option<String>,
    #[serde(default)]
    pub lyric_color: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub title_color: Option<String>,
    #[serde(default)]
    pub font_size: Option<i32>,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub auto_scroll_speed: Option<i32>,
    #[serde(default)]
    pub auto_scroll_enabled: Option<bool>,
    #[serde(default)]
    pub metronome_enabled: Option<bool>,
    #[serde(default)]
    pub metronome_volume: Option<i32>,
    #[serde(default)]
    pub metronome_tempo: Option<i32>,
    /// Kept as a string so an unknown mode is a validation error
    #[serde(default)]
    pub display_mode: Option<String>,
    #[serde(default)]
    pub show_capo: Option<bool>,
    #[serde(default)]
    pub show_key: Option<bool>,
    #[serde(default)]
    pub show_tempo: Option<bool>,
    #[serde(default)]
    pub show_difficulty: Option<bool>,
    #[serde(default)]
    pub metronome_settings: Option<serde_json::Value>,
    #[serde(default)]
    pub display_settings: Option<serde_json::Value>,
    #[serde(default)]
    pub keyboard_shortcuts: Option<serde_json::Value>,
}
