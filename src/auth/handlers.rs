//! Auth HTTP handlers: register, login.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::auth::CredentialVerifier;
use crate::db::{user_create, user_find_conflict};
use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::handlers::users::UserResponse;
use crate::models::Role;

pub const TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    if user_find_conflict(state.db(), Some(&body.username), Some(&body.email), None)
        .await?
        .is_some()
    {
        warn!(username = %body.username, "registration refused: user exists");
        return Err(AppError::Validation(
            "Email or username already registered".to_string(),
        ));
    }

    let password_hash = CredentialVerifier::hash_password(&body.password)?;
    let user = user_create(
        state.db(),
        &body.username,
        &body.email,
        &password_hash,
        body.role,
    )
    .await?;

    info!(username = %user.username, role = %user.role, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = CredentialVerifier::verify(state.db(), &body.username, &body.password).await?;
    let access_token = state.tokens().issue(&user)?;

    info!(username = %user.username, "user logged in");
    Ok(Json(TokenResponse {
        access_token,
        token_type: TOKEN_TYPE,
        expires_in: state.tokens().ttl().num_seconds(),
    }))
}
