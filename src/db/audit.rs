//! Audit trail persistence.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteExecutor};
use uuid::Uuid;

use super::{DbPool, Pagination};
use crate::error::AppResult;
use crate::models::AuditAction;

const AUDIT_COLUMNS: &str =
    "id, table_name, record_id, action, old_values, new_values, user_id, ip_address, created_at";

#[derive(Debug, Clone, FromRow)]
pub struct AuditLogRow {
    pub id: Uuid,
    pub table_name: String,
    pub record_id: String,
    pub action: AuditAction,
    pub old_values: Option<String>,
    pub new_values: Option<String>,
    pub user_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewAuditLog<'a> {
    pub table_name: &'a str,
    pub record_id: String,
    pub action: AuditAction,
    pub old_values: Option<String>,
    pub new_values: Option<String>,
    pub user_id: Option<Uuid>,
    pub ip_address: Option<&'a str>,
}

#[derive(Debug, Default)]
pub struct AuditLogFilter {
    pub table_name: Option<String>,
    pub action: Option<AuditAction>,
    pub user_id: Option<Uuid>,
}

pub async fn audit_log_insert<'e, E: SqliteExecutor<'e>>(
    executor: E,
    entry: NewAuditLog<'_>,
) -> AppResult<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO audit_log (id, table_name, record_id, action, old_values, new_values,
                               user_id, ip_address, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(entry.table_name)
    .bind(entry.record_id)
    .bind(entry.action)
    .bind(entry.old_values)
    .bind(entry.new_values)
    .bind(entry.user_id)
    .bind(entry.ip_address)
    .bind(Utc::now())
    .execute(executor)
    .await?;
    Ok(id)
}

pub async fn audit_log_list(
    pool: &DbPool,
    filter: &AuditLogFilter,
    page: Pagination,
) -> AppResult<Vec<AuditLogRow>> {
    let rows = sqlx::query_as::<_, AuditLogRow>(&format!(
        r#"
        SELECT {AUDIT_COLUMNS} FROM audit_log
        WHERE (? IS NULL OR table_name = ?)
          AND (? IS NULL OR action = ?)
          AND (? IS NULL OR user_id = ?)
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#
    ))
    .bind(filter.table_name.as_deref())
    .bind(filter.table_name.as_deref())
    .bind(filter.action)
    .bind(filter.action)
    .bind(filter.user_id)
    .bind(filter.user_id)
    .bind(page.limit())
    .bind(page.skip())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn audit_log_count(pool: &DbPool) -> AppResult<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audit_log")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

pub async fn audit_log_count_by_action(pool: &DbPool) -> AppResult<Vec<(AuditAction, i64)>> {
    let rows = sqlx::query_as::<_, (AuditAction, i64)>(
        "SELECT action, COUNT(*) FROM audit_log GROUP BY action ORDER BY action",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn audit_log_count_by_table(pool: &DbPool) -> AppResult<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT table_name, COUNT(*) FROM audit_log GROUP BY table_name ORDER BY table_name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
