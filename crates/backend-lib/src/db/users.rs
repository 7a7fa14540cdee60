//! Queries on the `users` table.

use chrono::{DateTime, Utc};
use guitartab_common::user::UserCounts;
use guitartab_common::Role;
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::models::DbUser;
use crate::pagination::PageRequest;

/// Filters of the admin user listing
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// Insert a fully built user row
pub async fn insert<'e, E: SqliteExecutor<'e>>(exec: E, user: &DbUser) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (
            id, username, email, password_hash, role, is_active, is_verified,
            first_name, last_name, bio, avatar_url, website_url,
            created_at, updated_at, last_login_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.role)
    .bind(user.is_active)
    .bind(user.is_verified)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.bio)
    .bind(&user.avatar_url)
    .bind(&user.website_url)
    .bind(user.created_at)
    .bind(user.updated_at)
    .bind(user.last_login_at)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn find_by_id<'e, E: SqliteExecutor<'e>>(exec: E, id: Uuid) -> Result<Option<DbUser>, sqlx::Error> {
    sqlx::query_as::<_, DbUser>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(exec)
        .await
}

/// Look a user up by exact username or by (case-insensitive) email
pub async fn find_by_login(pool: &SqlitePool, username_or_email: &str) -> Result<Option<DbUser>, sqlx::Error> {
    sqlx::query_as::<_, DbUser>("SELECT * FROM users WHERE username = ? OR email = ? LIMIT 1")
        .bind(username_or_email)
        .bind(username_or_email.to_lowercase())
        .fetch_optional(pool)
        .await
}

pub async fn username_taken(pool: &SqlitePool, username: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
        .bind(username)
        .fetch_one(pool)
        .await
}

pub async fn email_taken(pool: &SqlitePool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
        .bind(email.to_lowercase())
        .fetch_one(pool)
        .await
}

pub async fn record_login(pool: &SqlitePool, id: Uuid, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
        .bind(at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_password(pool: &SqlitePool, id: Uuid, password_hash: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Write the profile columns of `user`
pub async fn update_profile(pool: &SqlitePool, user: &DbUser) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users
        SET first_name = ?, last_name = ?, bio = ?, avatar_url = ?, website_url = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.bio)
    .bind(&user.avatar_url)
    .bind(&user.website_url)
    .bind(user.updated_at)
    .bind(user.id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_role(pool: &SqlitePool, id: Uuid, role: Role) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_active(pool: &SqlitePool, id: Uuid, active: bool) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?")
        .bind(active)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &UserFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = super::songs::like_pattern(search);
        qb.push(" AND (username LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR email LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR first_name LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR last_name LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
    if let Some(role) = filter.role {
        qb.push(" AND role = ").push_bind(role.as_str());
    }
    if let Some(active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(active);
    }
}

/// One page of users, newest first, plus the total match count
pub async fn list(pool: &SqlitePool, filter: &UserFilter, page: PageRequest) -> Result<(Vec<DbUser>, u64), sqlx::Error> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users");
    push_filter(&mut count, filter);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM users");
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let users = qb.build_query_as::<DbUser>().fetch_all(pool).await?;

    Ok((users, u64::try_from(total).unwrap_or(0)))
}

/// Counts for the system statistics
pub async fn counts(pool: &SqlitePool) -> Result<UserCounts, sqlx::Error> {
    let (total, active, admins, moderators): (i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*),
            COALESCE(SUM(is_active), 0),
            COALESCE(SUM(role = 'admin'), 0),
            COALESCE(SUM(role = 'moderator'), 0)
        FROM users
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(UserCounts {
        total,
        active,
        admins,
        moderators,
    })
}
