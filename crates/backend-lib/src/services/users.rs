//! Profiles, preferences and user administration.

use chrono::Utc;
use guitartab_common::user::{
    ActivationChanged, DisplayMode, Preferences, PreferencesChanges, ProfileChanges, RoleChanged, RoleUpdate,
    SystemStats, UserListQuery, UserStats, UserView,
};
use guitartab_common::{Page, Role};
use tracing::{info, warn};
use uuid::Uuid;

use crate::authz::{self, Subject};
use crate::db::models::DbUser;
use crate::db::{self, users::UserFilter};
use crate::error::AppError;
use crate::pagination::PageRequest;
use crate::validation::{self, normalize};
use crate::AppState;

async fn load(state: &AppState, id: Uuid) -> Result<DbUser, AppError> {
    db::users::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
}

fn parse_role(role: &str) -> Result<Role, AppError> {
    role.trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| AppError::invalid("role", "Role must be one of user, moderator, admin"))
}

pub async fn profile(state: &AppState, id: Uuid) -> Result<UserView, AppError> {
    Ok(load(state, id).await?.to_view())
}

/// Update the caller's own profile; `Some("")` clears a field
pub async fn update_profile(state: &AppState, id: Uuid, changes: ProfileChanges) -> Result<UserView, AppError> {
    let trim = |v: Option<String>| v.map(|s| s.trim().to_string());
    let changes = ProfileChanges {
        first_name: trim(changes.first_name),
        last_name: trim(changes.last_name),
        bio: trim(changes.bio),
        avatar_url: trim(changes.avatar_url),
        website_url: trim(changes.website_url),
    };
    let present = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
    validation::validate_profile(&ProfileChanges {
        first_name: present(&changes.first_name),
        last_name: present(&changes.last_name),
        bio: present(&changes.bio),
        avatar_url: present(&changes.avatar_url),
        website_url: present(&changes.website_url),
    })?;

    let mut user = load(state, id).await?;
    for (slot, value) in [
        (&mut user.first_name, changes.first_name),
        (&mut user.last_name, changes.last_name),
        (&mut user.bio, changes.bio),
        (&mut user.avatar_url, changes.avatar_url),
        (&mut user.website_url, changes.website_url),
    ] {
        if value.is_some() {
            *slot = normalize(value);
        }
    }
    user.updated_at = Utc::now();
    db::users::update_profile(&state.db, &user).await?;
    Ok(user.to_view())
}

/// Stored preferences, or the defaults if none were saved
pub async fn preferences(state: &AppState, user_id: Uuid) -> Result<Preferences, AppError> {
    Ok(db::preferences::find(&state.db, user_id).await?.unwrap_or_default())
}

fn apply_preferences(prefs: &mut Preferences, c: PreferencesChanges) {
    macro_rules! set {
        ($($field:ident),* $(,)?) => {
            $(if let Some(v) = c.$field {
                prefs.$field = v;
            })*
        };
    }
    set!(
        chord_color,
        lyric_color,
        background_color,
        title_color,
        font_size,
        auto_scroll_speed,
        auto_scroll_enabled,
        metronome_enabled,
        metronome_volume,
        metronome_tempo,
        show_capo,
        show_key,
        show_tempo,
        show_difficulty,
        metronome_settings,
        display_settings,
        keyboard_shortcuts,
    );
    if let Some(family) = c.font_family {
        prefs.font_family = family.trim().to_string();
    }
    if let Some(mode) = c.display_mode.as_deref().and_then(DisplayMode::parse) {
        prefs.display_mode = mode;
    }
}

/// Partial update; absent fields keep their current value
pub async fn update_preferences(
    state: &AppState,
    user_id: Uuid,
    changes: PreferencesChanges,
) -> Result<Preferences, AppError> {
    validation::validate_preferences(&changes)?;

    let mut prefs = preferences(state, user_id).await?;
    apply_preferences(&mut prefs, changes);
    db::preferences::upsert(&state.db, user_id, &prefs).await?;
    Ok(prefs)
}

pub async fn user_stats(state: &AppState, subject: &Subject, user_id: Uuid) -> Result<UserStats, AppError> {
    authz::require(authz::can_view_user_stats(subject, user_id), "view these statistics")?;
    let user = load(state, user_id).await?;
    let counts = db::songs::counts_for_user(&state.db, user_id).await?;

    Ok(UserStats {
        user_id,
        role: user.role(),
        username: user.username,
        is_active: user.is_active,
        total_songs: counts.total,
        public_songs: counts.public,
        flagged_songs: counts.flagged,
        total_views: counts.views,
        created_at: user.created_at,
        last_login_at: user.last_login_at,
    })
}

pub async fn list_users(state: &AppState, subject: &Subject, query: UserListQuery) -> Result<Page<UserView>, AppError> {
    authz::require(authz::can_administer(subject), "list users")?;

    let role = match normalize(query.role) {
        Some(r) => Some(parse_role(&r)?),
        None => None,
    };
    let search = normalize(query.search);
    if let Some(s) = &search {
        validation::validate_optional_length("search", Some(s), validation::MAX_SEARCH_LENGTH)?;
    }

    let p = &state.settings.pagination;
    let page = PageRequest::new(query.page, query.per_page, p.default_users_per_page, p.max_per_page);
    let filter = UserFilter {
        search,
        role,
        is_active: query.is_active,
    };
    let (users, total) = db::users::list(&state.db, &filter, page).await?;
    Ok(page.wrap(users.iter().map(DbUser::to_view).collect(), total))
}

pub async fn set_role(state: &AppState, subject: &Subject, user_id: Uuid, req: RoleUpdate) -> Result<RoleChanged, AppError> {
    authz::require(authz::can_administer(subject), "change user roles")?;
    let role = parse_role(&req.role)?;
    if user_id == subject.id {
        warn!(admin = %subject.id, "refused change of own role");
        return Err(AppError::BadRequest("You cannot change your own role".to_string()));
    }

    let user = load(state, user_id).await?;
    db::users::set_role(&state.db, user_id, role).await?;

    info!(admin = %subject.id, user_id = %user_id, from = %user.role(), to = %role, "role changed");
    Ok(RoleChanged {
        user_id,
        username: user.username,
        new_role: role,
    })
}

pub async fn set_active(
    state: &AppState,
    subject: &Subject,
    user_id: Uuid,
    active: bool,
) -> Result<ActivationChanged, AppError> {
    authz::require(authz::can_administer(subject), "change account status")?;
    if !active && user_id == subject.id {
        warn!(admin = %subject.id, "refused self deactivation");
        return Err(AppError::BadRequest("You cannot deactivate your own account".to_string()));
    }

    let user = load(state, user_id).await?;
    db::users::set_active(&state.db, user_id, active).await?;

    info!(admin = %subject.id, user_id = %user_id, active, "account status changed");
    Ok(ActivationChanged {
        username: user.username,
        is_active: active,
    })
}

pub async fn system_stats(state: &AppState, subject: &Subject) -> Result<SystemStats, AppError> {
    authz::require(authz::can_administer(subject), "view system statistics")?;
    let users = db::users::counts(&state.db).await?;
    let (songs, content, engagement) = db::songs::system_counts(&state.db).await?;
    Ok(SystemStats {
        users,
        songs,
        content,
        engagement,
    })
}
