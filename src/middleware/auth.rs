//! Auth extractors: bearer token to the current user, with optional role gate.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tracing::debug;

use crate::auth::Claims;
use crate::db::{user_get_by_id, UserRow};
use crate::error::{AppError, AppResult};
use crate::handlers::http::AppState;
use crate::models::Role;

/// Extractor: any authenticated, active user.
#[derive(Clone, Debug)]
pub struct AuthUser(pub UserRow);

/// Extractor: authenticated user whose token carries the admin role.
#[derive(Clone, Debug)]
pub struct AdminUser(pub UserRow);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts, state).await?;
        let claims = state.tokens().validate(&token)?;
        Ok(AuthUser(load_active_user(state, &claims).await?))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts, state).await?;
        let claims = state.tokens().authorize(&token, Role::Admin)?;
        Ok(AdminUser(load_active_user(state, &claims).await?))
    }
}

async fn bearer_token(parts: &mut Parts, state: &AppState) -> AppResult<String> {
    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                debug!(error = %e, "missing bearer token");
                AppError::Unauthorized("Missing or invalid Authorization header".to_string())
            })?;
    Ok(bearer.token().to_string())
}

async fn load_active_user(state: &AppState, claims: &Claims) -> AppResult<UserRow> {
    let user = user_get_by_id(state.db(), claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;
    if !user.is_active {
        return Err(AppError::Validation("Inactive user".to_string()));
    }
    Ok(user)
}
