//! User profile and administration handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::CredentialVerifier;
use crate::db::{
    user_find_conflict, user_get_by_id, user_update, users_list, Pagination, UserChanges, UserRow,
};
use crate::error::{AppError, AppResult};
use crate::handlers::http::AppState;
use crate::middleware::{AdminUser, AuthUser};
use crate::models::Role;

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserResponse {
    fn from(u: UserRow) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
            is_active: u.is_active,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Fields any authenticated user may see about another.
#[derive(Debug, Serialize)]
pub struct UserPublicResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// GET /users/me
pub async fn get_me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(user.into())
}

/// PUT /users/me
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let changes = UserChanges {
        username: body.username,
        email: body.email,
        password_hash: hash_optional(body.password.as_deref())?,
        ..Default::default()
    };
    let updated = apply_user_changes(&state, user.id, changes).await?;
    info!(username = %updated.username, "profile updated");
    Ok(Json(updated.into()))
}

/// GET /users/public
pub async fn list_public(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<UserPublicResponse>>, AppError> {
    let rows = users_list(state.db(), page, true).await?;
    Ok(Json(
        rows.into_iter()
            .map(|u| UserPublicResponse {
                id: u.id,
                username: u.username,
                email: u.email,
                role: u.role,
                is_active: u.is_active,
            })
            .collect(),
    ))
}

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let rows = users_list(state.db(), page, false).await?;
    Ok(Json(rows.into_iter().map(UserResponse::from).collect()))
}

/// GET /users/:id
pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user = user_get_by_id(state.db(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user.into()))
}

/// PUT /users/:id
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<AdminUpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let changes = UserChanges {
        username: body.username,
        email: body.email,
        password_hash: hash_optional(body.password.as_deref())?,
        role: body.role,
        is_active: body.is_active,
    };
    let updated = apply_user_changes(&state, id, changes).await?;
    info!(admin = %admin.username, username = %updated.username, role = %updated.role, "user updated");
    Ok(Json(updated.into()))
}

/// DELETE /users/:id: deactivates the account.
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let changes = UserChanges {
        is_active: Some(false),
        ..Default::default()
    };
    let user = user_update(state.db(), id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    info!(admin = %admin.username, username = %user.username, "user deactivated");
    Ok(StatusCode::NO_CONTENT)
}

fn hash_optional(password: Option<&str>) -> AppResult<Option<String>> {
    password.map(CredentialVerifier::hash_password).transpose()
}

async fn apply_user_changes(state: &AppState, id: Uuid, changes: UserChanges) -> AppResult<UserRow> {
    if user_find_conflict(
        state.db(),
        changes.username.as_deref(),
        changes.email.as_deref(),
        Some(id),
    )
    .await?
    .is_some()
    {
        return Err(AppError::Validation(
            "Email or username already registered".to_string(),
        ));
    }
    user_update(state.db(), id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}
