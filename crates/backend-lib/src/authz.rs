//! Role and ownership checks.
//!
//! Every rule is a pure function of the caller and the resource state, so
//! the handlers and services can gate work before touching the database.
//! [`push_song_visibility`] renders the view rule as SQL for listings.

use guitartab_common::Role;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::error::AppError;

/// An authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    pub id: Uuid,
    pub role: Role,
}

impl Subject {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }

    /// Moderator or admin
    pub fn is_staff(&self) -> bool {
        self.is_admin() || self.is_moderator()
    }
}

/// The parts of a song that decide access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SongAccess {
    pub owner_id: Uuid,
    pub is_public: bool,
    pub is_flagged: bool,
}

impl SongAccess {
    /// Public and not flagged
    pub fn is_publicly_visible(&self) -> bool {
        self.is_public && !self.is_flagged
    }
}

/// The parts of a songlist that decide access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SonglistAccess {
    pub owner_id: Uuid,
    pub is_public: bool,
    pub is_shared: bool,
}

pub fn can_view_song(subject: Option<&Subject>, song: &SongAccess) -> bool {
    match subject {
        Some(s) if s.is_staff() || s.id == song.owner_id => true,
        _ => song.is_publicly_visible(),
    }
}

pub fn can_edit_song(subject: &Subject, song: &SongAccess) -> bool {
    if subject.is_admin() {
        return true;
    }
    if subject.is_moderator() && (song.is_flagged || !song.is_public) {
        return true;
    }
    subject.id == song.owner_id
}

pub fn can_delete_song(subject: &Subject, song: &SongAccess) -> bool {
    if subject.is_admin() {
        return true;
    }
    if subject.is_moderator() && song.is_flagged {
        return true;
    }
    subject.id == song.owner_id
}

/// Review queue, approve and reject
pub fn can_moderate(subject: &Subject) -> bool {
    subject.is_staff()
}

/// Featuring and everything under `/api/admin`
pub fn can_administer(subject: &Subject) -> bool {
    subject.is_admin()
}

pub fn can_view_songlist(subject: Option<&Subject>, list: &SonglistAccess) -> bool {
    if list.is_public || list.is_shared {
        return true;
    }
    subject.is_some_and(|s| s.is_admin() || s.id == list.owner_id)
}

pub fn can_modify_songlist(subject: &Subject, list: &SonglistAccess) -> bool {
    subject.is_admin() || subject.id == list.owner_id
}

pub fn can_view_user_stats(subject: &Subject, user_id: Uuid) -> bool {
    subject.is_admin() || subject.id == user_id
}

/// Turn a failed check into a 403
pub fn require(allowed: bool, action: &str) -> Result<(), AppError> {
    if allowed {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(format!(
            "You do not have permission to {action}"
        )))
    }
}

/// Append ` AND <visibility>` for the songs table aliased `alias`. Matches
/// [`can_view_song`] row by row so page totals only count visible songs.
pub fn push_song_visibility(builder: &mut QueryBuilder<'_, Sqlite>, subject: Option<&Subject>, alias: &str) {
    match subject {
        Some(s) if s.is_staff() => {},
        Some(s) => {
            builder
                .push(format!(" AND ({alias}.user_id = "))
                .push_bind(s.id)
                .push(format!(" OR ({alias}.is_public = 1 AND {alias}.is_flagged = 0))"));
        },
        None => {
            builder.push(format!(" AND ({alias}.is_public = 1 AND {alias}.is_flagged = 0)"));
        },
    }
}
