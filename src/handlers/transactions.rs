//! Withdrawal/return transaction handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::db::{
    transaction_get_by_id, transactions_list, Pagination, TransactionChanges, TransactionFilter,
    TransactionRow,
};
use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::{AuthUser, ClientIp};
use crate::models::{TransactionStatus, TransactionType};
use crate::services::{AuditContext, MovementRequest, TransactionService};

#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    pub equipment_id: Option<Uuid>,
    pub bag_id: Option<Uuid>,
    pub event_id: Uuid,
    pub transaction_type: TransactionType,
    pub scheduled_date: Option<DateTime<Utc>>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTransactionRequest {
    pub status: Option<TransactionStatus>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub actual_date: Option<DateTime<Utc>>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

fn audit_context(user_id: Uuid, ip: ClientIp) -> AuditContext {
    AuditContext {
        user_id,
        ip_address: ip.0,
    }
}

/// GET /transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Query(q): Query<TransactionQuery>,
) -> Result<Json<Vec<TransactionRow>>, AppError> {
    let filter = TransactionFilter {
        transaction_type: q.transaction_type,
        status: q.status,
    };
    let rows = transactions_list(state.db(), &filter, Pagination::new(q.skip, q.limit)).await?;
    Ok(Json(rows))
}

/// GET /transactions/:id
pub async fn get_transaction(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionRow>, AppError> {
    let row = transaction_get_by_id(state.db(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;
    Ok(Json(row))
}

/// POST /transactions: withdraw or return one item or a whole bag for an event.
pub async fn create_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ip: ClientIp,
    Json(body): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionRow>), AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let ctx = audit_context(user.id, ip);
    let row = TransactionService::create(
        state.db(),
        &ctx,
        MovementRequest {
            equipment_id: body.equipment_id,
            bag_id: body.bag_id,
            event_id: body.event_id,
            transaction_type: body.transaction_type,
            scheduled_date: body.scheduled_date,
            notes: body.notes,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /transactions/:id
pub async fn update_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ip: ClientIp,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTransactionRequest>,
) -> Result<Json<TransactionRow>, AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let ctx = audit_context(user.id, ip);
    let changes = TransactionChanges {
        status: body.status,
        scheduled_date: body.scheduled_date,
        actual_date: body.actual_date,
        notes: body.notes,
    };
    let row = TransactionService::update(state.db(), &ctx, id, changes).await?;
    Ok(Json(row))
}

/// DELETE /transactions/:id: cancels rather than deletes.
pub async fn cancel_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ip: ClientIp,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let ctx = audit_context(user.id, ip);
    TransactionService::cancel(state.db(), &ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
