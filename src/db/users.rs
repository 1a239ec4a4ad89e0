//! User persistence.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteExecutor};
use uuid::Uuid;

use super::{DbPool, Pagination};
use crate::error::AppResult;
use crate::models::Role;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, is_active, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields to overwrite on a user; `None` leaves the stored value untouched.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

pub async fn user_create<'e, E: SqliteExecutor<'e>>(
    executor: E,
    username: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> AppResult<UserRow> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        INSERT INTO users (id, username, email, password_hash, role, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, 1, ?, ?)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await?;
    Ok(row)
}

pub async fn user_find_by_username(pool: &DbPool, username: &str) -> AppResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn user_get_by_id(pool: &DbPool, id: Uuid) -> AppResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Another user already holding `username` or `email`, ignoring `exclude`.
pub async fn user_find_conflict(
    pool: &DbPool,
    username: Option<&str>,
    email: Option<&str>,
    exclude: Option<Uuid>,
) -> AppResult<Option<UserRow>> {
    if username.is_none() && email.is_none() {
        return Ok(None);
    }
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        SELECT {USER_COLUMNS} FROM users
        WHERE (username = ? OR email = ?) AND (? IS NULL OR id <> ?)
        LIMIT 1
        "#
    ))
    .bind(username)
    .bind(email)
    .bind(exclude)
    .bind(exclude)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn users_list(pool: &DbPool, page: Pagination, only_active: bool) -> AppResult<Vec<UserRow>> {
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        SELECT {USER_COLUMNS} FROM users
        WHERE (? = 0 OR is_active = 1)
        ORDER BY created_at
        LIMIT ? OFFSET ?
        "#
    ))
    .bind(only_active)
    .bind(page.limit())
    .bind(page.skip())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn user_update(pool: &DbPool, id: Uuid, changes: UserChanges) -> AppResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        UPDATE users SET
            username = COALESCE(?, username),
            email = COALESCE(?, email),
            password_hash = COALESCE(?, password_hash),
            role = COALESCE(?, role),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(changes.username)
    .bind(changes.email)
    .bind(changes.password_hash)
    .bind(changes.role)
    .bind(changes.is_active)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// `(total, active)` user counts.
pub async fn users_count(pool: &DbPool) -> AppResult<(i64, i64)> {
    let row: (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(CASE WHEN is_active = 1 THEN 1 ELSE 0 END), 0) FROM users",
    )
    .fetch_one(pool)
    .await?;
    Ok(row)
}
