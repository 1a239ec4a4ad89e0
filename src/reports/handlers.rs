//! Report HTTP handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{
    audit_log_count, audit_log_count_by_action, audit_log_count_by_table, audit_log_list,
    equipment_count_by_category, equipment_count_by_status, equipment_status_counts,
    event_status_counts, transaction_status_counts, users_count, AuditLogFilter, AuditLogRow,
    Pagination,
};
use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::{AdminUser, AuthUser};
use crate::models::{AuditAction, EquipmentStatus};

// ---- Dashboard ----

#[derive(Debug, Serialize)]
pub struct EquipmentSummary {
    pub total: i64,
    pub available: i64,
    pub in_use: i64,
    pub maintenance: i64,
}

#[derive(Debug, Serialize)]
pub struct EventSummary {
    pub planned: i64,
    pub in_progress: i64,
    pub completed: i64,
}

#[derive(Debug, Serialize)]
pub struct TransactionSummary {
    pub pending: i64,
    pub completed: i64,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub total: i64,
    pub active: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub equipment: EquipmentSummary,
    pub events: EventSummary,
    pub transactions: TransactionSummary,
    pub users: UserSummary,
}

/// GET /reports/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
) -> Result<Json<DashboardResponse>, AppError> {
    let db = state.db();
    let (total, available, in_use, maintenance) = equipment_status_counts(db).await?;
    let (planned, in_progress, completed) = event_status_counts(db).await?;
    let (pending, tx_completed) = transaction_status_counts(db).await?;
    let (users_total, users_active) = users_count(db).await?;

    Ok(Json(DashboardResponse {
        equipment: EquipmentSummary {
            total,
            available,
            in_use,
            maintenance,
        },
        events: EventSummary {
            planned,
            in_progress,
            completed,
        },
        transactions: TransactionSummary {
            pending,
            completed: tx_completed,
        },
        users: UserSummary {
            total: users_total,
            active: users_active,
        },
    }))
}

// ---- Equipment usage ----

#[derive(Debug, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: EquipmentStatus,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct EquipmentUsageResponse {
    pub by_category: Vec<CategoryCount>,
    pub by_status: Vec<StatusCount>,
}

/// GET /reports/equipment-usage
pub async fn equipment_usage(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
) -> Result<Json<EquipmentUsageResponse>, AppError> {
    let by_category = equipment_count_by_category(state.db()).await?;
    let by_status = equipment_count_by_status(state.db()).await?;
    Ok(Json(EquipmentUsageResponse {
        by_category: by_category
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect(),
        by_status: by_status
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect(),
    }))
}

// ---- Audit log ----

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub table_name: Option<String>,
    pub action: Option<AuditAction>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    pub id: Uuid,
    pub table_name: String,
    pub record_id: String,
    pub action: AuditAction,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub user_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn parse_snapshot(raw: Option<String>) -> Option<serde_json::Value> {
    raw.map(|s| serde_json::from_str(&s).unwrap_or(serde_json::Value::String(s)))
}

impl From<AuditLogRow> for AuditLogResponse {
    fn from(r: AuditLogRow) -> Self {
        Self {
            id: r.id,
            table_name: r.table_name,
            record_id: r.record_id,
            action: r.action,
            old_values: parse_snapshot(r.old_values),
            new_values: parse_snapshot(r.new_values),
            user_id: r.user_id,
            ip_address: r.ip_address,
            created_at: r.created_at,
        }
    }
}

/// GET /reports/audit-log: newest first.
pub async fn audit_log(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Query(q): Query<AuditLogQuery>,
) -> Result<Json<Vec<AuditLogResponse>>, AppError> {
    let filter = AuditLogFilter {
        table_name: q.table_name,
        action: q.action,
        user_id: q.user_id,
    };
    let rows = audit_log_list(state.db(), &filter, Pagination::new(q.skip, q.limit)).await?;
    Ok(Json(rows.into_iter().map(AuditLogResponse::from).collect()))
}

#[derive(Debug, Serialize)]
pub struct ActionCount {
    pub action: &'static str,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct TableCount {
    pub table: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct AuditSummaryResponse {
    pub total: i64,
    pub by_action: Vec<ActionCount>,
    pub by_table: Vec<TableCount>,
}

/// GET /reports/audit-log/summary
pub async fn audit_log_summary(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<AuditSummaryResponse>, AppError> {
    let total = audit_log_count(state.db()).await?;
    let by_action = audit_log_count_by_action(state.db()).await?;
    let by_table = audit_log_count_by_table(state.db()).await?;
    Ok(Json(AuditSummaryResponse {
        total,
        by_action: by_action
            .into_iter()
            .map(|(action, count)| ActionCount {
                action: action_label(action),
                count,
            })
            .collect(),
        by_table: by_table
            .into_iter()
            .map(|(table, count)| TableCount { table, count })
            .collect(),
    }))
}

fn action_label(action: AuditAction) -> &'static str {
    match action {
        AuditAction::Insert => "INSERT",
        AuditAction::Update => "UPDATE",
        AuditAction::Delete => "DELETE",
    }
}
