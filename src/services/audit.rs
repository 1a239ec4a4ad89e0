//! Audit trail writes for state-changing operations.

use serde::Serialize;
use serde_json::json;
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::db::{audit_log_insert, NewAuditLog};
use crate::error::AppResult;
use crate::models::AuditAction;

/// Who performed a change and from where.
#[derive(Debug, Clone)]
pub struct AuditContext {
    pub user_id: Uuid,
    pub ip_address: Option<String>,
}

fn snapshot<T: Serialize>(value: Option<&T>) -> AppResult<Option<String>> {
    value
        .map(serde_json::to_string)
        .transpose()
        .map_err(Into::into)
}

/// Record a change to `table_name`/`record_id` with optional before and after snapshots.
pub async fn record<'e, E, Old, New>(
    executor: E,
    ctx: &AuditContext,
    table_name: &str,
    record_id: Uuid,
    action: AuditAction,
    old: Option<&Old>,
    new: Option<&New>,
) -> AppResult<Uuid>
where
    E: SqliteExecutor<'e>,
    Old: Serialize,
    New: Serialize,
{
    audit_log_insert(
        executor,
        NewAuditLog {
            table_name,
            record_id: record_id.to_string(),
            action,
            old_values: snapshot(old)?,
            new_values: snapshot(new)?,
            user_id: Some(ctx.user_id),
            ip_address: ctx.ip_address.as_deref(),
        },
    )
    .await
}

/// `{"status": ...}` snapshot used for status-only changes.
pub fn status_snapshot<S: Serialize>(status: S) -> serde_json::Value {
    json!({ "status": status })
}
