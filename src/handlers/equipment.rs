//! Equipment catalogue handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::db::{
    equipment_create, equipment_find_by, equipment_get_by_id, equipment_list, equipment_set_status,
    equipment_update, DbPool, EquipmentChanges, EquipmentFilter, EquipmentKey, EquipmentRow,
    NewEquipment, Pagination,
};
use crate::error::{AppError, AppResult};
use crate::handlers::http::AppState;
use crate::middleware::{AdminUser, AuthUser};
use crate::models::{EquipmentCondition, EquipmentStatus};

#[derive(Debug, Serialize)]
pub struct EquipmentResponse {
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

impl From<EquipmentRow> for EquipmentResponse {
    fn from(r: EquipmentRow) -> Self {
        Self {
            id: r.id,
            code: r.code,
            name: r.name,
            category: r.category,
            serial: r.serial,
            qr_code: r.qr_code,
            status: r.status,
            condition: r.condition,
            location: r.location,
            description: r.description,
            image: r.image,
            bag_id: r.bag_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EquipmentQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub status: Option<EquipmentStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEquipmentRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(length(max = 100))]
    pub serial: Option<String>,
    #[validate(length(max = 100))]
    pub qr_code: Option<String>,
    #[serde(default)]
    pub status: EquipmentStatus,
    #[serde(default)]
    pub condition: EquipmentCondition,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 500))]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEquipmentRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[validate(length(max = 100))]
    pub serial: Option<String>,
    #[validate(length(max = 100))]
    pub qr_code: Option<String>,
    pub status: Option<EquipmentStatus>,
    pub condition: Option<EquipmentCondition>,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 500))]
    pub image: Option<String>,
}

/// GET /equipment
pub async fn list_equipment(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Query(q): Query<EquipmentQuery>,
) -> Result<Json<Vec<EquipmentResponse>>, AppError> {
    let filter = EquipmentFilter {
        category: q.category,
        status: q.status,
    };
    let rows = equipment_list(state.db(), &filter, Pagination::new(q.skip, q.limit)).await?;
    Ok(Json(rows.into_iter().map(EquipmentResponse::from).collect()))
}

/// GET /equipment/:id
pub async fn get_equipment(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<EquipmentResponse>, AppError> {
    let row = equipment_get_by_id(state.db(), id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(row.into()))
}

/// GET /equipment/qr/:qr_code
pub async fn get_equipment_by_qr(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(qr_code): Path<String>,
) -> Result<Json<EquipmentResponse>, AppError> {
    let row = equipment_find_by(state.db(), EquipmentKey::QrCode, &qr_code)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(row.into()))
}

/// GET /equipment/code/:code
pub async fn get_equipment_by_code(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(code): Path<String>,
) -> Result<Json<EquipmentResponse>, AppError> {
    let row = equipment_find_by(state.db(), EquipmentKey::Code, &code)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(row.into()))
}

/// POST /equipment
pub async fn create_equipment(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<CreateEquipmentRequest>,
) -> Result<(StatusCode, Json<EquipmentResponse>), AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    ensure_unique(
        state.db(),
        None,
        Some(&body.code),
        body.serial.as_deref(),
        body.qr_code.as_deref(),
    )
    .await?;

    let row = equipment_create(
        state.db(),
        NewEquipment {
            code: body.code,
            name: body.name,
            category: body.category,
            serial: body.serial,
            qr_code: body.qr_code,
            status: body.status,
            condition: body.condition,
            location: body.location,
            description: body.description,
            image: body.image,
        },
    )
    .await?;
    info!(admin = %admin.username, code = %row.code, "equipment created");
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// PUT /equipment/:id
pub async fn update_equipment(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateEquipmentRequest>,
) -> Result<Json<EquipmentResponse>, AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    ensure_unique(
        state.db(),
        Some(id),
        body.code.as_deref(),
        body.serial.as_deref(),
        body.qr_code.as_deref(),
    )
    .await?;

    let changes = EquipmentChanges {
        code: body.code,
        name: body.name,
        category: body.category,
        serial: body.serial,
        qr_code: body.qr_code,
        status: body.status,
        condition: body.condition,
        location: body.location,
        description: body.description,
        image: body.image,
    };
    let row = equipment_update(state.db(), id, changes)
        .await?
        .ok_or_else(not_found)?;
    info!(admin = %admin.username, code = %row.code, "equipment updated");
    Ok(Json(row.into()))
}

/// DELETE /equipment/:id: marks the item excluded.
pub async fn delete_equipment(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !equipment_set_status(state.db(), id, EquipmentStatus::Excluded).await? {
        return Err(not_found());
    }
    info!(admin = %admin.username, equipment_id = %id, "equipment excluded");
    Ok(StatusCode::NO_CONTENT)
}

fn not_found() -> AppError {
    AppError::NotFound("Equipment not found".to_string())
}

/// Refuse a code, serial or QR code already held by another item.
async fn ensure_unique(
    pool: &DbPool,
    own_id: Option<Uuid>,
    code: Option<&str>,
    serial: Option<&str>,
    qr_code: Option<&str>,
) -> AppResult<()> {
    let checks = [
        (EquipmentKey::Code, code, "Equipment code already exists"),
        (EquipmentKey::Serial, serial, "Serial number already exists"),
        (EquipmentKey::QrCode, qr_code, "QR code already exists"),
    ];
    for (key, value, message) in checks {
        let Some(value) = value else { continue };
        if let Some(existing) = equipment_find_by(pool, key, value).await? {
            if Some(existing.id) != own_id {
                warn!(?key, value = %value, "duplicate equipment key");
                return Err(AppError::Validation(message.to_string()));
            }
        }
    }
    Ok(())
}
