//! Shared application state and the health check.

use axum::{http::StatusCode, Json};
use serde_json::json;

use crate::auth::TokenService;
use crate::db::DbPool;

/// Shared application state for every route.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(db: DbPool, tokens: TokenService) -> Self {
        Self { db, tokens }
    }
    pub fn db(&self) -> &DbPool {
        &self.db
    }
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}

/// GET /health: liveness check.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "asset-tracker" })),
    )
}
