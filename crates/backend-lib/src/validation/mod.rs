// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request validation module.

use std::fmt;
use std::sync::LazyLock;

use chrono::{Datelike, Utc};
use guitartab_common::song::{AdvancedSearch, NewSong, SongChanges, SongQuery};
use guitartab_common::songlist::{NewSonglist, SonglistChanges};
use guitartab_common::user::{PreferencesChanges, ProfileChanges, RegisterRequest};
use regex::Regex;
use thiserror::Error;

use crate::auth::{password_problems, PasswordRequirements};

// Common validation constants
pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
const MAX_NAME_LENGTH: usize = 100;
const MAX_BIO_LENGTH: usize = 2000;
const MAX_URL_LENGTH: usize = 500;
pub const MAX_TITLE_LENGTH: usize = 255;
const MAX_GENRE_LENGTH: usize = 100;
const MAX_KEY_LENGTH: usize = 10;
/// Upper bound for lyrics, chords and tab, in bytes
pub const MAX_CONTENT_BYTES: usize = 50 * 1024;
pub const MAX_FLAG_REASON_LENGTH: usize = 500;
const MAX_DESCRIPTION_LENGTH: usize = 2000;
const MAX_NOTES_LENGTH: usize = 1000;
const MAX_FONT_FAMILY_LENGTH: usize = 100;
pub const MAX_SEARCH_LENGTH: usize = 200;
pub const MIN_YEAR: i32 = 1900;

// Regex patterns for validation
static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("valid username regex"));
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});
static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid url regex"));
static HEX_COLOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid color regex"));

/// A single rejected field
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be between {min} and {max} characters")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },

    #[error("{field} must not exceed {max} bytes")]
    TooLarge { field: &'static str, max: usize },

    #[error("{field} must be between {min} and {max}")]
    Range {
        field: &'static str,
        min: i64,
        max: i64,
    },

    #[error("{field} must be between {min} and {max}")]
    FloatRange {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("{message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl ValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Required { field }
            | ValidationError::Length { field, .. }
            | ValidationError::TooLarge { field, .. }
            | ValidationError::Range { field, .. }
            | ValidationError::FloatRange { field, .. }
            | ValidationError::Invalid { field, .. } => field,
        }
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ValidationError::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Every problem found in one request
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn single(err: ValidationError) -> Self {
        Self(vec![err])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Collects failures so a request reports all bad fields at once
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, result: ValidationResult<()>) -> &mut Self {
        if let Err(e) = result {
            self.errors.push(e);
        }
        self
    }

    pub fn push(&mut self, err: ValidationError) -> &mut Self {
        self.errors.push(err);
        self
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

/// Trim and drop empty strings
pub fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validate a username
pub fn validate_username(username: &str) -> ValidationResult<()> {
    if username.is_empty() {
        return Err(ValidationError::Required { field: "username" });
    }

    let len = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) {
        return Err(ValidationError::Length {
            field: "username",
            min: MIN_USERNAME_LENGTH,
            max: MAX_USERNAME_LENGTH,
        });
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::invalid(
            "username",
            "Username may only contain letters, digits, '_', '.' and '-'",
        ));
    }

    Ok(())
}

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<()> {
    if email.is_empty() {
        return Err(ValidationError::Required { field: "email" });
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::invalid(
            "email",
            format!("Email address cannot exceed {MAX_EMAIL_LENGTH} characters"),
        ));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::invalid("email", "Invalid email address format"));
    }

    Ok(())
}

/// Validate a password against the configured requirements, reporting the
/// first rule it breaks
pub fn validate_password(password: &str, requirements: &PasswordRequirements) -> ValidationResult<()> {
    match password_problems(password, requirements).into_iter().next() {
        Some(problem) => Err(ValidationError::invalid("password", problem)),
        None => Ok(()),
    }
}

/// Character count of `value` within `min..=max`
pub fn validate_length(field: &'static str, value: &str, min: usize, max: usize) -> ValidationResult<()> {
    if min > 0 && value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::Length { field, min, max });
    }
    Ok(())
}

/// Same as [`validate_length`] with no lower bound, skipping `None`
pub fn validate_optional_length(field: &'static str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) => validate_length(field, v, 0, max),
        None => Ok(()),
    }
}

/// Large text bodies are limited by byte size
pub fn validate_content(field: &'static str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(v) if v.len() > MAX_CONTENT_BYTES => Err(ValidationError::TooLarge {
            field,
            max: MAX_CONTENT_BYTES,
        }),
        _ => Ok(()),
    }
}

/// Integer within `min..=max`
pub fn validate_range(field: &'static str, value: i64, min: i64, max: i64) -> ValidationResult<()> {
    if value < min || value > max {
        return Err(ValidationError::Range { field, min, max });
    }
    Ok(())
}

fn validate_optional_range(field: &'static str, value: Option<i32>, min: i64, max: i64) -> ValidationResult<()> {
    match value {
        Some(v) => validate_range(field, i64::from(v), min, max),
        None => Ok(()),
    }
}

/// Release year between 1900 and the current year
pub fn validate_year(field: &'static str, year: Option<i32>) -> ValidationResult<()> {
    validate_optional_range(field, year, i64::from(MIN_YEAR), i64::from(Utc::now().year()))
}

/// A rating in `0.0..=5.0`
pub fn validate_rating(field: &'static str, rating: f64) -> ValidationResult<()> {
    if !rating.is_finite() || !(0.0..=5.0).contains(&rating) {
        return Err(ValidationError::FloatRange {
            field,
            min: 0.0,
            max: 5.0,
        });
    }
    Ok(())
}

fn validate_optional_rating(field: &'static str, rating: Option<f64>) -> ValidationResult<()> {
    match rating {
        Some(r) => validate_rating(field, r),
        None => Ok(()),
    }
}

/// Absolute http(s) URL
pub fn validate_url(field: &'static str, url: Option<&str>) -> ValidationResult<()> {
    let Some(url) = url else {
        return Ok(());
    };
    if url.is_empty() {
        return Ok(());
    }
    if url.len() > MAX_URL_LENGTH || !URL_REGEX.is_match(url) {
        return Err(ValidationError::invalid(
            field,
            format!("{field} must be a valid http or https URL"),
        ));
    }
    Ok(())
}

/// `#RRGGBB` color
pub fn validate_hex_color(field: &'static str, color: Option<&str>) -> ValidationResult<()> {
    match color {
        Some(c) if !HEX_COLOR_REGEX.is_match(c) => Err(ValidationError::invalid(
            field,
            format!("{field} must be a hex color like #1A2B3C"),
        )),
        _ => Ok(()),
    }
}

fn validate_min_max<T: PartialOrd>(field: &'static str, min: Option<T>, max: Option<T>) -> ValidationResult<()> {
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Err(ValidationError::invalid(
                field,
                format!("{field} minimum must not exceed maximum"),
            ));
        }
    }
    Ok(())
}

fn validate_json_object(field: &'static str, value: Option<&serde_json::Value>) -> ValidationResult<()> {
    match value {
        Some(v) if !v.is_object() => Err(ValidationError::invalid(
            field,
            format!("{field} must be a JSON object"),
        )),
        _ => Ok(()),
    }
}

/// Validate a registration request
pub fn validate_registration(
    req: &RegisterRequest,
    requirements: &PasswordRequirements,
) -> Result<(), ValidationErrors> {
    let mut v = Validator::new();
    v.check(validate_username(req.username.trim()))
        .check(validate_email(req.email.trim()))
        .check(validate_optional_length("first_name", req.first_name.as_deref(), MAX_NAME_LENGTH))
        .check(validate_optional_length("last_name", req.last_name.as_deref(), MAX_NAME_LENGTH));
    for problem in password_problems(&req.password, requirements) {
        v.push(ValidationError::invalid("password", problem));
    }
    v.finish()
}

/// Validate a profile update
pub fn validate_profile(changes: &ProfileChanges) -> Result<(), ValidationErrors> {
    let mut v = Validator::new();
    v.check(validate_optional_length("first_name", changes.first_name.as_deref(), MAX_NAME_LENGTH))
        .check(validate_optional_length("last_name", changes.last_name.as_deref(), MAX_NAME_LENGTH))
        .check(validate_optional_length("bio", changes.bio.as_deref(), MAX_BIO_LENGTH))
        .check(validate_url("avatar_url", changes.avatar_url.as_deref()))
        .check(validate_url("website_url", changes.website_url.as_deref()));
    v.finish()
}

/// Validate a new song
pub fn validate_new_song(song: &NewSong) -> Result<(), ValidationErrors> {
    let mut v = Validator::new();
    v.check(validate_length("title", &song.title, 1, MAX_TITLE_LENGTH))
        .check(validate_length("artist", &song.artist, 1, MAX_TITLE_LENGTH));
    check_song_fields(
        &mut v,
        SongFields {
            album: song.album.as_deref(),
            lyrics: song.lyrics.as_deref(),
            chords: song.chords.as_deref(),
            tab: song.tab.as_deref(),
            genre: song.genre.as_deref(),
            year: song.year,
            musical_key: song.musical_key.as_deref(),
            tempo: song.tempo,
            capo_position: song.capo_position,
            difficulty: song.difficulty,
            source_url: song.source_url.as_deref(),
        },
    );
    v.finish()
}

/// Validate a partial song update
pub fn validate_song_changes(changes: &SongChanges) -> Result<(), ValidationErrors> {
    let mut v = Validator::new();
    if let Some(title) = &changes.title {
        v.check(validate_length("title", title, 1, MAX_TITLE_LENGTH));
    }
    if let Some(artist) = &changes.artist {
        v.check(validate_length("artist", artist, 1, MAX_TITLE_LENGTH));
    }
    check_song_fields(
        &mut v,
        SongFields {
            album: changes.album.as_deref(),
            lyrics: changes.lyrics.as_deref(),
            chords: changes.chords.as_deref(),
            tab: changes.tab.as_deref(),
            genre: changes.genre.as_deref(),
            year: changes.year,
            musical_key: changes.musical_key.as_deref(),
            tempo: changes.tempo,
            capo_position: changes.capo_position,
            difficulty: changes.difficulty,
            source_url: changes.source_url.as_deref(),
        },
    );
    v.finish()
}

struct SongFields<'a> {
    album: Option<&'a str>,
    lyrics: Option<&'a str>,
    chords: Option<&'a str>,
    tab: Option<&'a str>,
    genre: Option<&'a str>,
    year: Option<i32>,
    musical_key: Option<&'a str>,
    tempo: Option<i32>,
    capo_position: Option<i32>,
    difficulty: Option<i32>,
    source_url: Option<&'a str>,
}

fn check_song_fields(v: &mut Validator, f: SongFields<'_>) {
    v.check(validate_optional_length("album", f.album, MAX_TITLE_LENGTH))
        .check(validate_content("lyrics", f.lyrics))
        .check(validate_content("chords", f.chords))
        .check(validate_content("tab", f.tab))
        .check(validate_optional_length("genre", f.genre, MAX_GENRE_LENGTH))
        .check(validate_year("year", f.year))
        .check(validate_optional_length("musical_key", f.musical_key, MAX_KEY_LENGTH))
        .check(validate_optional_range("tempo", f.tempo, 20, 300))
        .check(validate_optional_range("capo_position", f.capo_position, 0, 12))
        .check(validate_optional_range("difficulty", f.difficulty, 1, 5))
        .check(validate_url("source_url", f.source_url));
}

/// Validate the filter part of a song listing query
pub fn validate_song_query(q: &SongQuery) -> Result<(), ValidationErrors> {
    let mut v = Validator::new();
    v.check(validate_optional_length("search", q.search.as_deref(), MAX_SEARCH_LENGTH))
        .check(validate_optional_length("genre", q.genre.as_deref(), MAX_GENRE_LENGTH))
        .check(validate_optional_range("difficulty_min", q.difficulty_min, 1, 5))
        .check(validate_optional_range("difficulty_max", q.difficulty_max, 1, 5))
        .check(validate_min_max("difficulty", q.difficulty_min, q.difficulty_max))
        .check(validate_year("year_from", q.year_from))
        .check(validate_year("year_to", q.year_to))
        .check(validate_min_max("year", q.year_from, q.year_to))
        .check(validate_optional_rating("rating_min", q.rating_min))
        .check(validate_optional_rating("rating_max", q.rating_max))
        .check(validate_min_max("rating", q.rating_min, q.rating_max));
    v.finish()
}

/// Validate an advanced search body
pub fn validate_advanced_search(s: &AdvancedSearch) -> Result<(), ValidationErrors> {
    let mut v = Validator::new();
    v.check(validate_optional_length("query", s.query.as_deref(), MAX_SEARCH_LENGTH))
        .check(validate_optional_length("artist", s.artist.as_deref(), MAX_TITLE_LENGTH))
        .check(validate_optional_length("album", s.album.as_deref(), MAX_TITLE_LENGTH))
        .check(validate_year("year_from", s.year_from))
        .check(validate_year("year_to", s.year_to))
        .check(validate_min_max("year", s.year_from, s.year_to))
        .check(validate_optional_rating("rating_min", s.rating_min))
        .check(validate_optional_rating("rating_max", s.rating_max))
        .check(validate_min_max("rating", s.rating_min, s.rating_max));
    for level in s.difficulty_range.iter().flatten() {
        v.check(validate_range("difficulty_range", i64::from(*level), 1, 5));
    }
    for genre in s.genre.iter().flatten() {
        v.check(validate_length("genre", genre, 1, MAX_GENRE_LENGTH));
    }
    v.finish()
}

/// Validate a flag reason
pub fn validate_flag_reason(reason: &str) -> ValidationResult<()> {
    validate_length("reason", reason, 1, MAX_FLAG_REASON_LENGTH)
}

/// Validate a new songlist
pub fn validate_new_songlist(list: &NewSonglist) -> Result<(), ValidationErrors> {
    let mut v = Validator::new();
    v.check(validate_length("name", &list.name, 1, MAX_TITLE_LENGTH))
        .check(validate_optional_length("description", list.description.as_deref(), MAX_DESCRIPTION_LENGTH));
    v.finish()
}

/// Validate a songlist update
pub fn validate_songlist_changes(changes: &SonglistChanges) -> Result<(), ValidationErrors> {
    let mut v = Validator::new();
    if let Some(name) = &changes.name {
        v.check(validate_length("name", name, 1, MAX_TITLE_LENGTH));
    }
    v.check(validate_optional_length("description", changes.description.as_deref(), MAX_DESCRIPTION_LENGTH));
    v.finish()
}

/// Validate a songlist entry position and notes
pub fn validate_entry(position: Option<i32>, notes: Option<&str>) -> Result<(), ValidationErrors> {
    let mut v = Validator::new();
    v.check(validate_optional_range("position", position, 1, i64::from(i32::MAX)))
        .check(validate_optional_length("notes", notes, MAX_NOTES_LENGTH));
    v.finish()
}

/// Validate a preferences update
pub fn validate_preferences(p: &PreferencesChanges) -> Result<(), ValidationErrors> {
    let mut v = Validator::new();
    v.check(validate_hex_color("chord_color", p.chord_color.as_deref()))
        .check(validate_hex_color("lyric_color", p.lyric_color.as_deref()))
        .check(validate_hex_color("background_color", p.background_color.as_deref()))
        .check(validate_hex_color("title_color", p.title_color.as_deref()))
        .check(validate_optional_range("font_size", p.font_size, 8, 72))
        .check(validate_optional_range("auto_scroll_speed", p.auto_scroll_speed, 1, 100))
        .check(validate_optional_range("metronome_volume", p.metronome_volume, 0, 100))
        .check(validate_optional_range("metronome_tempo", p.metronome_tempo, 20, 300))
        .check(validate_json_object("metronome_settings", p.metronome_settings.as_ref()))
        .check(validate_json_object("display_settings", p.display_settings.as_ref()))
        .check(validate_json_object("keyboard_shortcuts", p.keyboard_shortcuts.as_ref()));
    if let Some(family) = &p.font_family {
        v.check(validate_length("font_family", family, 1, MAX_FONT_FAMILY_LENGTH));
    }
    if let Some(mode) = &p.display_mode {
        if guitartab_common::user::DisplayMode::parse(mode).is_none() {
            v.push(ValidationError::invalid(
                "display_mode",
                "display_mode must be one of chords_above, chords_inline, tab_only",
            ));
        }
    }
    v.finish()
}
