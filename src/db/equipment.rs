//! Equipment persistence.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteExecutor};
use uuid::Uuid;

use super::{DbPool, Pagination};
use crate::error::AppResult;
use crate::models::{EquipmentCondition, EquipmentStatus};

const EQUIPMENT_COLUMNS: &str = "id, code, name, category, serial, qr_code, status, condition, \
     location, description, image, bag_id, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct EquipmentRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub category: String,
    pub serial: Option<String>,
    pub qr_code: Option<String>,
    pub status: EquipmentStatus,
    pub condition: EquipmentCondition,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub bag_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewEquipment {
    pub code: String,
    pub name: String,
    pub category: String,
    pub serial: Option<String>,
    pub qr_code: Option<String>,
    pub status: EquipmentStatus,
    pub condition: EquipmentCondition,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct EquipmentChanges {
    pub code: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub serial: Option<String>,
    pub qr_code: Option<String>,
    pub status: Option<EquipmentStatus>,
    pub condition: Option<EquipmentCondition>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Default)]
pub struct EquipmentFilter {
    pub category: Option<String>,
    pub status: Option<EquipmentStatus>,
}

pub async fn equipment_create(pool: &DbPool, new: NewEquipment) -> AppResult<EquipmentRow> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, EquipmentRow>(&format!(
        r#"
        INSERT INTO equipment (id, code, name, category, serial, qr_code, status, condition,
                               location, description, image, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {EQUIPMENT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(new.code)
    .bind(new.name)
    .bind(new.category)
    .bind(new.serial)
    .bind(new.qr_code)
    .bind(new.status)
    .bind(new.condition)
    .bind(new.location)
    .bind(new.description)
    .bind(new.image)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn equipment_get_by_id<'e, E: SqliteExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> AppResult<Option<EquipmentRow>> {
    let row = sqlx::query_as::<_, EquipmentRow>(&format!(
        "SELECT {EQUIPMENT_COLUMNS} FROM equipment WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// Lookup by a unique text column: `code`, `serial` or `qr_code`.
pub async fn equipment_find_by(
    pool: &DbPool,
    column: EquipmentKey,
    value: &str,
) -> AppResult<Option<EquipmentRow>> {
    let row = sqlx::query_as::<_, EquipmentRow>(&format!(
        "SELECT {EQUIPMENT_COLUMNS} FROM equipment WHERE {} = ?",
        column.as_column()
    ))
    .bind(value)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquipmentKey {
    Code,
    Serial,
    QrCode,
}

impl EquipmentKey {
    fn as_column(&self) -> &'static str {
        match self {
            EquipmentKey::Code => "code",
            EquipmentKey::Serial => "serial",
            EquipmentKey::QrCode => "qr_code",
        }
    }
}

pub async fn equipment_list(
    pool: &DbPool,
    filter: &EquipmentFilter,
    page: Pagination,
) -> AppResult<Vec<EquipmentRow>> {
    let rows = sqlx::query_as::<_, EquipmentRow>(&format!(
        r#"
        SELECT {EQUIPMENT_COLUMNS} FROM equipment
        WHERE (? IS NULL OR category = ?) AND (? IS NULL OR status = ?)
        ORDER BY code
        LIMIT ? OFFSET ?
        "#
    ))
    .bind(filter.category.as_deref())
    .bind(filter.category.as_deref())
    .bind(filter.status)
    .bind(filter.status)
    .bind(page.limit())
    .bind(page.skip())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn equipment_update(
    pool: &DbPool,
    id: Uuid,
    changes: EquipmentChanges,
) -> AppResult<Option<EquipmentRow>> {
    let row = sqlx::query_as::<_, EquipmentRow>(&format!(
        r#"
        UPDATE equipment SET
            code = COALESCE(?, code),
            name = COALESCE(?, name),
            category = COALESCE(?, category),
            serial = COALESCE(?, serial),
            qr_code = COALESCE(?, qr_code),
            status = COALESCE(?, status),
            condition = COALESCE(?, condition),
            location = COALESCE(?, location),
            description = COALESCE(?, description),
            image = COALESCE(?, image),
            updated_at = ?
        WHERE id = ?
        RETURNING {EQUIPMENT_COLUMNS}
        "#
    ))
    .bind(changes.code)
    .bind(changes.name)
    .bind(changes.category)
    .bind(changes.serial)
    .bind(changes.qr_code)
    .bind(changes.status)
    .bind(changes.condition)
    .bind(changes.location)
    .bind(changes.description)
    .bind(changes.image)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn equipment_set_status<'e, E: SqliteExecutor<'e>>(
    executor: E,
    id: Uuid,
    status: EquipmentStatus,
) -> AppResult<bool> {
    let r = sqlx::query("UPDATE equipment SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(r.rows_affected() > 0)
}

/// Items currently grouped in `bag_id`, ordered by code.
pub async fn equipment_in_bag<'e, E: SqliteExecutor<'e>>(
    executor: E,
    bag_id: Uuid,
) -> AppResult<Vec<EquipmentRow>> {
    let rows = sqlx::query_as::<_, EquipmentRow>(&format!(
        "SELECT {EQUIPMENT_COLUMNS} FROM equipment WHERE bag_id = ? ORDER BY code"
    ))
    .bind(bag_id)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}

/// Case-insensitive code lookup, used when scanning labels into a bag.
pub async fn equipment_find_by_code_nocase(
    pool: &DbPool,
    code: &str,
) -> AppResult<Option<EquipmentRow>> {
    let row = sqlx::query_as::<_, EquipmentRow>(&format!(
        "SELECT {EQUIPMENT_COLUMNS} FROM equipment WHERE code = ? COLLATE NOCASE LIMIT 1"
    ))
    .bind(code)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Move an item into `bag_id`, or out of any bag with `None`.
pub async fn equipment_set_bag(pool: &DbPool, id: Uuid, bag_id: Option<Uuid>) -> AppResult<bool> {
    let r = sqlx::query("UPDATE equipment SET bag_id = ?, updated_at = ? WHERE id = ?")
        .bind(bag_id)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(r.rows_affected() > 0)
}

/// Per-status counts: `(total, available, in_use, maintenance)`.
pub async fn equipment_status_counts(pool: &DbPool) -> AppResult<(i64, i64, i64, i64)> {
    let row: (i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COALESCE(SUM(CASE WHEN status = 'available' THEN 1 ELSE 0 END), 0),
               COALESCE(SUM(CASE WHEN status = 'in_use' THEN 1 ELSE 0 END), 0),
               COALESCE(SUM(CASE WHEN status = 'maintenance' THEN 1 ELSE 0 END), 0)
        FROM equipment
        "#,
    )
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn equipment_count_by_category(pool: &DbPool) -> AppResult<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT category, COUNT(*) FROM equipment GROUP BY category ORDER BY COUNT(*) DESC, category",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn equipment_count_by_status(pool: &DbPool) -> AppResult<Vec<(EquipmentStatus, i64)>> {
    let rows = sqlx::query_as::<_, (EquipmentStatus, i64)>(
        "SELECT status, COUNT(*) FROM equipment GROUP BY status ORDER BY COUNT(*) DESC, status",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
