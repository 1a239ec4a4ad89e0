//! Reservation persistence.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqliteExecutor};
use uuid::Uuid;

use super::{DbPool, Pagination};
use crate::error::AppResult;
use crate::models::ReservationStatus;

const RESERVATION_COLUMNS: &str = "id, equipment_id, bag_id, event_id, reserved_by, start_date, \
     end_date, status, created_at, updated_at";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReservationRow {
    pub id: Uuid,
    pub equipment_id: Option<Uuid>,
    pub bag_id: Option<Uuid>,
    pub event_id: Uuid,
    pub reserved_by: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewReservation {
    pub equipment_id: Option<Uuid>,
    pub bag_id: Option<Uuid>,
    pub event_id: Uuid,
    pub reserved_by: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ReservationChanges {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<ReservationStatus>,
}

#[derive(Debug, Default)]
pub struct ReservationFilter {
    pub status: Option<ReservationStatus>,
    pub event_id: Option<Uuid>,
}

pub async fn reservation_create<'e, E: SqliteExecutor<'e>>(
    executor: E,
    new: NewReservation,
) -> AppResult<ReservationRow> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, ReservationRow>(&format!(
        r#"
        INSERT INTO reservations (id, equipment_id, bag_id, event_id, reserved_by, start_date,
                                  end_date, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 'active', ?, ?)
        RETURNING {RESERVATION_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(new.equipment_id)
    .bind(new.bag_id)
    .bind(new.event_id)
    .bind(new.reserved_by)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await?;
    Ok(row)
}

pub async fn reservation_get_by_id<'e, E: SqliteExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> AppResult<Option<ReservationRow>> {
    let row = sqlx::query_as::<_, ReservationRow>(&format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

pub async fn reservations_list(
    pool: &DbPool,
    filter: &ReservationFilter,
    page: Pagination,
) -> AppResult<Vec<ReservationRow>> {
    let rows = sqlx::query_as::<_, ReservationRow>(&format!(
        r#"
        SELECT {RESERVATION_COLUMNS} FROM reservations
        WHERE (? IS NULL OR status = ?) AND (? IS NULL OR event_id = ?)
        ORDER BY start_date DESC
        LIMIT ? OFFSET ?
        "#
    ))
    .bind(filter.status)
    .bind(filter.status)
    .bind(filter.event_id)
    .bind(filter.event_id)
    .bind(page.limit())
    .bind(page.skip())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn reservation_update<'e, E: SqliteExecutor<'e>>(
    executor: E,
    id: Uuid,
    changes: ReservationChanges,
) -> AppResult<Option<ReservationRow>> {
    let row = sqlx::query_as::<_, ReservationRow>(&format!(
        r#"
        UPDATE reservations SET
            start_date = COALESCE(?, start_date),
            end_date = COALESCE(?, end_date),
            status = COALESCE(?, status),
            updated_at = ?
        WHERE id = ?
        RETURNING {RESERVATION_COLUMNS}
        "#
    ))
    .bind(changes.start_date)
    .bind(changes.end_date)
    .bind(changes.status)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// Whether another active reservation for the same item or bag overlaps `[start, end)`.
pub async fn reservation_overlaps<'e, E: SqliteExecutor<'e>>(
    executor: E,
    equipment_id: Option<Uuid>,
    bag_id: Option<Uuid>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude: Option<Uuid>,
) -> AppResult<bool> {
    let (n,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM reservations
        WHERE status = 'active'
          AND ((? IS NOT NULL AND equipment_id = ?) OR (? IS NOT NULL AND bag_id = ?))
          AND start_date < ? AND end_date > ?
          AND (? IS NULL OR id <> ?)
        "#,
    )
    .bind(equipment_id)
    .bind(equipment_id)
    .bind(bag_id)
    .bind(bag_id)
    .bind(end)
    .bind(start)
    .bind(exclude)
    .bind(exclude)
    .fetch_one(executor)
    .await?;
    Ok(n > 0)
}
