//! Reservation handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{
    reservation_get_by_id, reservations_list, Pagination, ReservationChanges, ReservationFilter,
    ReservationRow,
};
use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::{AdminUser, AuthUser, ClientIp};
use crate::models::ReservationStatus;
use crate::services::{AuditContext, ReservationRequest, ReservationService};

#[derive(Debug, Deserialize)]
pub struct ReservationQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<ReservationStatus>,
    pub event_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub equipment_id: Option<Uuid>,
    pub bag_id: Option<Uuid>,
    pub event_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReservationRequest {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<ReservationStatus>,
}

/// GET /reservations
pub async fn list_reservations(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Query(q): Query<ReservationQuery>,
) -> Result<Json<Vec<ReservationRow>>, AppError> {
    let filter = ReservationFilter {
        status: q.status,
        event_id: q.event_id,
    };
    let rows = reservations_list(state.db(), &filter, Pagination::new(q.skip, q.limit)).await?;
    Ok(Json(rows))
}

/// GET /reservations/:id
pub async fn get_reservation(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ReservationRow>, AppError> {
    let row = reservation_get_by_id(state.db(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Reservation not found".to_string()))?;
    Ok(Json(row))
}

/// POST /reservations: the caller is recorded as `reserved_by`.
pub async fn create_reservation(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ip: ClientIp,
    Json(body): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<ReservationRow>), AppError> {
    let ctx = AuditContext {
        user_id: admin.id,
        ip_address: ip.0,
    };
    let row = ReservationService::create(
        state.db(),
        &ctx,
        ReservationRequest {
            equipment_id: body.equipment_id,
            bag_id: body.bag_id,
            event_id: body.event_id,
            start_date: body.start_date,
            end_date: body.end_date,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /reservations/:id
pub async fn update_reservation(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ip: ClientIp,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateReservationRequest>,
) -> Result<Json<ReservationRow>, AppError> {
    let ctx = AuditContext {
        user_id: admin.id,
        ip_address: ip.0,
    };
    let changes = ReservationChanges {
        start_date: body.start_date,
        end_date: body.end_date,
        status: body.status,
    };
    let row = ReservationService::update(state.db(), &ctx, id, changes).await?;
    Ok(Json(row))
}

/// DELETE /reservations/:id: cancels and releases the target.
pub async fn cancel_reservation(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ip: ClientIp,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let ctx = AuditContext {
        user_id: admin.id,
        ip_address: ip.0,
    };
    ReservationService::cancel(state.db(), &ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
