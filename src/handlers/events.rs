//! Event handlers. Reads are open to any signed-in user, writes need admin.

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
    event_create, event_find_by_code, event_get_by_id, event_set_status, event_update, events_list,
    EventChanges, EventRow, NewEvent, Pagination,
};
use crate::error::{AppError, AppResult};
use crate::handlers::http::AppState;
use crate::middleware::{AdminUser, AuthUser};
use crate::models::EventStatus;

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub event_type: String,
    pub category: Option<String>,
    pub status: EventStatus,
    pub color: &'static str,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub owner_id: Option<Uuid>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventRow> for EventResponse {
    fn from(r: EventRow) -> Self {
        Self {
            color: r.status.color(),
            id: r.id,
            code: r.code,
            name: r.name,
            event_type: r.event_type,
            category: r.category,
            status: r.status,
            start_date: r.start_date,
            end_date: r.end_date,
            owner_id: r.owner_id,
            location: r.location,
            description: r.description,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EventQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<EventStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub event_type: String,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[serde(default)]
    pub status: EventStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub owner_id: Option<Uuid>,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub event_type: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub status: Option<EventStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub owner_id: Option<Uuid>,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    pub description: Option<String>,
}

fn check_dates(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<()> {
    if end < start {
        return Err(AppError::Validation(
            "end_date must not be before start_date".to_string(),
        ));
    }
    Ok(())
}

fn not_found() -> AppError {
    AppError::NotFound("Event not found".to_string())
}

/// GET /events
pub async fn list_events(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Query(q): Query<EventQuery>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let rows = events_list(state.db(), q.status, Pagination::new(q.skip, q.limit)).await?;
    Ok(Json(rows.into_iter().map(EventResponse::from).collect()))
}

/// GET /events/:id
pub async fn get_event(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<EventResponse>, AppError> {
    let row = event_get_by_id(state.db(), id).await?.ok_or_else(not_found)?;
    Ok(Json(row.into()))
}

/// GET /events/code/:code
pub async fn get_event_by_code(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(code): Path<String>,
) -> Result<Json<EventResponse>, AppError> {
    let row = event_find_by_code(state.db(), &code)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(row.into()))
}

/// POST /events: the caller owns the event unless `owner_id` is given.
pub async fn create_event(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    check_dates(body.start_date, body.end_date)?;

    if event_find_by_code(state.db(), &body.code).await?.is_some() {
        warn!(code = %body.code, "duplicate event code");
        return Err(AppError::Validation("Event code already exists".to_string()));
    }

    let row = event_create(
        state.db(),
        NewEvent {
            code: body.code,
            name: body.name,
            event_type: body.event_type,
            category: body.category,
            status: body.status,
            start_date: body.start_date,
            end_date: body.end_date,
            owner_id: body.owner_id.unwrap_or(admin.id),
            location: body.location,
            description: body.description,
        },
    )
    .await?;
    info!(admin = %admin.username, code = %row.code, "event created");
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// PUT /events/:id
pub async fn update_event(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let current = event_get_by_id(state.db(), id).await?.ok_or_else(not_found)?;
    check_dates(
        body.start_date.unwrap_or(current.start_date),
        body.end_date.unwrap_or(current.end_date),
    )?;

    if let Some(code) = body.code.as_deref() {
        if let Some(other) = event_find_by_code(state.db(), code).await? {
            if other.id != id {
                return Err(AppError::Validation("Event code already exists".to_string()));
            }
        }
    }

    let changes = EventChanges {
        code: body.code,
        name: body.name,
        event_type: body.event_type,
        category: body.category,
        status: body.status,
        start_date: body.start_date,
        end_date: body.end_date,
        owner_id: body.owner_id,
        location: body.location,
        description: body.description,
    };
    let row = event_update(state.db(), id, changes)
        .await?
        .ok_or_else(not_found)?;
    info!(admin = %admin.username, code = %row.code, "event updated");
    Ok(Json(row.into()))
}

/// DELETE /events/:id: cancels the event.
pub async fn delete_event(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !event_set_status(state.db(), id, EventStatus::Cancelled).await? {
        return Err(not_found());
    }
    info!(admin = %admin.username, event_id = %id, "event cancelled");
    Ok(StatusCode::NO_CONTENT)
}
