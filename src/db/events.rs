//! Event persistence.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteExecutor};
use uuid::Uuid;

use super::{DbPool, Pagination};
use crate::error::AppResult;
use crate::models::EventStatus;

const EVENT_COLUMNS: &str = "id, code, name, event_type, category, status, start_date, end_date, \
     owner_id, location, description, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub event_type: String,
    pub category: Option<String>,
    pub status: EventStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub owner_id: Option<Uuid>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewEvent {
    pub code: String,
    pub name: String,
    pub event_type: String,
    pub category: Option<String>,
    pub status: EventStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub owner_id: Uuid,
    pub location: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default)]
pub struct EventChanges {
    pub code: Option<String>,
    pub name: Option<String>,
    pub event_type: Option<String>,
    pub category: Option<String>,
    pub status: Option<EventStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub owner_id: Option<Uuid>,
    pub location: Option<String>,
    pub description: Option<String>,
}

pub async fn event_create(pool: &DbPool, new: NewEvent) -> AppResult<EventRow> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, EventRow>(&format!(
        r#"
        INSERT INTO events (id, code, name, event_type, category, status, start_date, end_date,
                            owner_id, location, description, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {EVENT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(new.code)
    .bind(new.name)
    .bind(new.event_type)
    .bind(new.category)
    .bind(new.status)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(new.owner_id)
    .bind(new.location)
    .bind(new.description)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn event_get_by_id<'e, E: SqliteExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> AppResult<Option<EventRow>> {
    let row = sqlx::query_as::<_, EventRow>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

pub async fn event_find_by_code(pool: &DbPool, code: &str) -> AppResult<Option<EventRow>> {
    let row = sqlx::query_as::<_, EventRow>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE code = ?"
    ))
    .bind(code)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn events_list(
    pool: &DbPool,
    status: Option<EventStatus>,
    page: Pagination,
) -> AppResult<Vec<EventRow>> {
    let rows = sqlx::query_as::<_, EventRow>(&format!(
        r#"
        SELECT {EVENT_COLUMNS} FROM events
        WHERE (? IS NULL OR status = ?)
        ORDER BY start_date DESC
        LIMIT ? OFFSET ?
        "#
    ))
    .bind(status)
    .bind(status)
    .bind(page.limit())
    .bind(page.skip())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn event_update(pool: &DbPool, id: Uuid, changes: EventChanges) -> AppResult<Option<EventRow>> {
    let row = sqlx::query_as::<_, EventRow>(&format!(
        r#"
        UPDATE events SET
            code = COALESCE(?, code),
            name = COALESCE(?, name),
            event_type = COALESCE(?, event_type),
            category = COALESCE(?, category),
            status = COALESCE(?, status),
            start_date = COALESCE(?, start_date),
            end_date = COALESCE(?, end_date),
            owner_id = COALESCE(?, owner_id),
            location = COALESCE(?, location),
            description = COALESCE(?, description),
            updated_at = ?
        WHERE id = ?
        RETURNING {EVENT_COLUMNS}
        "#
    ))
    .bind(changes.code)
    .bind(changes.name)
    .bind(changes.event_type)
    .bind(changes.category)
    .bind(changes.status)
    .bind(changes.start_date)
    .bind(changes.end_date)
    .bind(changes.owner_id)
    .bind(changes.location)
    .bind(changes.description)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn event_set_status<'e, E: SqliteExecutor<'e>>(
    executor: E,
    id: Uuid,
    status: EventStatus,
) -> AppResult<bool> {
    let r = sqlx::query("UPDATE events SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(r.rows_affected() > 0)
}

/// `(planned, in_progress, completed)` event counts.
pub async fn event_status_counts(pool: &DbPool) -> AppResult<(i64, i64, i64)> {
    let row: (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(CASE WHEN status = 'planned' THEN 1 ELSE 0 END), 0),
               COALESCE(SUM(CASE WHEN status = 'in_progress' THEN 1 ELSE 0 END), 0),
               COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0)
        FROM events
        "#,
    )
    .fetch_one(pool)
    .await?;
    Ok(row)
}
