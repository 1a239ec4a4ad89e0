//! Bag persistence.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteExecutor};
use uuid::Uuid;

use super::{DbPool, Pagination};
use crate::error::AppResult;
use crate::models::BagStatus;

const BAG_COLUMNS: &str = "id, code, name, description, status, is_active, created_at, updated_at, \
     (SELECT COUNT(*) FROM equipment e WHERE e.bag_id = bags.id) AS equipment_count";

#[derive(Debug, Clone, FromRow)]
pub struct BagRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub status: BagStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub equipment_count: i64,
}

#[derive(Debug)]
pub struct NewBag {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub status: BagStatus,
}

#[derive(Debug, Default)]
pub struct BagChanges {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<BagStatus>,
}

pub async fn bag_create(pool: &DbPool, new: NewBag) -> AppResult<BagRow> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO bags (id, code, name, description, status, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(id)
    .bind(new.code)
    .bind(new.name)
    .bind(new.description)
    .bind(new.status)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let row = sqlx::query_as::<_, BagRow>(&format!("SELECT {BAG_COLUMNS} FROM bags WHERE id = ?"))
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

pub async fn bag_get_by_id<'e, E: SqliteExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> AppResult<Option<BagRow>> {
    let row = sqlx::query_as::<_, BagRow>(&format!("SELECT {BAG_COLUMNS} FROM bags WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

pub async fn bag_find_by_code(pool: &DbPool, code: &str) -> AppResult<Option<BagRow>> {
    let row = sqlx::query_as::<_, BagRow>(&format!("SELECT {BAG_COLUMNS} FROM bags WHERE code = ?"))
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Bags filtered by `status`; excluded bags are hidden unless asked for.
pub async fn bags_list(
    pool: &DbPool,
    status: Option<BagStatus>,
    page: Pagination,
) -> AppResult<Vec<BagRow>> {
    let rows = sqlx::query_as::<_, BagRow>(&format!(
        r#"
        SELECT {BAG_COLUMNS} FROM bags
        WHERE (? IS NULL AND status <> 'excluded') OR status = ?
        ORDER BY code
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

pub async fn bag_update(pool: &DbPool, id: Uuid, changes: BagChanges) -> AppResult<Option<BagRow>> {
    let r = sqlx::query(
        r#"
        UPDATE bags SET
            code = COALESCE(?, code),
            name = COALESCE(?, name),
            description = COALESCE(?, description),
            status = COALESCE(?, status),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(changes.code)
    .bind(changes.name)
    .bind(changes.description)
    .bind(changes.status)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;
    if r.rows_affected() == 0 {
        return Ok(None);
    }
    bag_get_by_id(pool, id).await
}

pub async fn bag_set_status<'e, E: SqliteExecutor<'e>>(
    executor: E,
    id: Uuid,
    status: BagStatus,
) -> AppResult<bool> {
    let r = sqlx::query("UPDATE bags SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(r.rows_affected() > 0)
}
