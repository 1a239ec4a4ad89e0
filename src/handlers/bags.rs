//! Bag handlers: named kits of equipment that move together.

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
    bag_create, bag_find_by_code, bag_get_by_id, bag_set_status, bag_update, bags_list,
    equipment_find_by_code_nocase, equipment_get_by_id, equipment_in_bag, equipment_set_bag,
    BagChanges, BagRow, DbPool, NewBag, Pagination,
};
use crate::error::{AppError, AppResult};
use crate::handlers::equipment::EquipmentResponse;
use crate::handlers::http::AppState;
use crate::middleware::{AdminUser, AuthUser};
use crate::models::BagStatus;

#[derive(Debug, Serialize)]
pub struct BagResponse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub status: BagStatus,
    pub is_active: bool,
    pub equipment_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BagRow> for BagResponse {
    fn from(r: BagRow) -> Self {
        Self {
            id: r.id,
            code: r.code,
            name: r.name,
            description: r.description,
            status: r.status,
            is_active: r.is_active,
            equipment_count: r.equipment_count,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// A bag together with the items it holds.
#[derive(Debug, Serialize)]
pub struct BagDetailResponse {
    #[serde(flatten)]
    pub bag: BagResponse,
    pub equipment_items: Vec<EquipmentResponse>,
}

#[derive(Debug, Deserialize)]
pub struct BagQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<BagStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBagRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: BagStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBagRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<BagStatus>,
}

async fn detail(pool: &DbPool, bag: BagRow) -> AppResult<BagDetailResponse> {
    let items = equipment_in_bag(pool, bag.id).await?;
    Ok(BagDetailResponse {
        bag: bag.into(),
        equipment_items: items.into_iter().map(EquipmentResponse::from).collect(),
    })
}

fn not_found() -> AppError {
    AppError::NotFound("Bag not found".to_string())
}

/// GET /bags
pub async fn list_bags(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Query(q): Query<BagQuery>,
) -> Result<Json<Vec<BagResponse>>, AppError> {
    let rows = bags_list(state.db(), q.status, Pagination::new(q.skip, q.limit)).await?;
    Ok(Json(rows.into_iter().map(BagResponse::from).collect()))
}

/// GET /bags/:id
pub async fn get_bag(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BagDetailResponse>, AppError> {
    let bag = bag_get_by_id(state.db(), id).await?.ok_or_else(not_found)?;
    Ok(Json(detail(state.db(), bag).await?))
}

/// GET /bags/code/:code
pub async fn get_bag_by_code(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(code): Path<String>,
) -> Result<Json<BagDetailResponse>, AppError> {
    let bag = bag_find_by_code(state.db(), &code)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(detail(state.db(), bag).await?))
}

/// POST /bags
pub async fn create_bag(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<CreateBagRequest>,
) -> Result<(StatusCode, Json<BagResponse>), AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    ensure_code_free(state.db(), None, &body.code).await?;

    let row = bag_create(
        state.db(),
        NewBag {
            code: body.code,
            name: body.name,
            description: body.description,
            status: body.status,
        },
    )
    .await?;
    info!(admin = %admin.username, code = %row.code, "bag created");
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// PUT /bags/:id
pub async fn update_bag(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateBagRequest>,
) -> Result<Json<BagResponse>, AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    if let Some(code) = body.code.as_deref() {
        ensure_code_free(state.db(), Some(id), code).await?;
    }

    let changes = BagChanges {
        code: body.code,
        name: body.name,
        description: body.description,
        status: body.status,
    };
    let row = bag_update(state.db(), id, changes)
        .await?
        .ok_or_else(not_found)?;
    info!(admin = %admin.username, code = %row.code, "bag updated");
    Ok(Json(row.into()))
}

/// DELETE /bags/:id: marks the bag excluded.
pub async fn delete_bag(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !bag_set_status(state.db(), id, BagStatus::Excluded).await? {
        return Err(not_found());
    }
    info!(admin = %admin.username, bag_id = %id, "bag excluded");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /bags/:id/equipment/:equipment_code
pub async fn add_equipment_to_bag(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path((id, equipment_code)): Path<(Uuid, String)>,
) -> Result<Json<BagResponse>, AppError> {
    let bag = bag_get_by_id(state.db(), id).await?.ok_or_else(not_found)?;
    if bag.status == BagStatus::Excluded {
        return Err(AppError::Validation(
            "Cannot add equipment to an excluded bag".to_string(),
        ));
    }
    let item = equipment_find_by_code_nocase(state.db(), &equipment_code)
        .await?
        .ok_or_else(|| AppError::NotFound("Equipment not found".to_string()))?;

    match item.bag_id {
        Some(current) if current == bag.id => {
            return Err(AppError::Validation(format!(
                "Equipment {} is already in this bag",
                item.code
            )));
        }
        Some(current) => {
            let other = bag_get_by_id(state.db(), current).await?;
            warn!(equipment = %item.code, "equipment already bagged elsewhere");
            return Err(AppError::Validation(match other {
                Some(o) => format!(
                    "Equipment {} already belongs to bag {} ({})",
                    item.code, o.name, o.code
                ),
                None => format!("Equipment {} already belongs to another bag", item.code),
            }));
        }
        None => {}
    }

    equipment_set_bag(state.db(), item.id, Some(bag.id)).await?;
    let row = bag_get_by_id(state.db(), id).await?.ok_or_else(not_found)?;
    info!(admin = %admin.username, bag = %row.code, equipment = %item.code, "equipment bagged");
    Ok(Json(row.into()))
}

/// DELETE /bags/:id/equipment/:equipment_id
pub async fn remove_equipment_from_bag(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path((id, equipment_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    bag_get_by_id(state.db(), id).await?.ok_or_else(not_found)?;
    let item = equipment_get_by_id(state.db(), equipment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Equipment not found".to_string()))?;
    if item.bag_id != Some(id) {
        return Err(AppError::Validation(format!(
            "Equipment {} is not in this bag",
            item.code
        )));
    }
    equipment_set_bag(state.db(), item.id, None).await?;
    info!(admin = %admin.username, bag_id = %id, equipment = %item.code, "equipment unbagged");
    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_code_free(pool: &DbPool, own_id: Option<Uuid>, code: &str) -> AppResult<()> {
    if let Some(existing) = bag_find_by_code(pool, code).await? {
        if Some(existing.id) != own_id {
            return Err(AppError::Validation("Bag code already exists".to_string()));
        }
    }
    Ok(())
}
