//! User CRUD handlers.

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use parley_core::repository::Page;
use parley_types::id::UserId;
use parley_types::user::{CreateUserRequest, UpdateUserRequest, User};

use crate::http::error::AppError;
use crate::http::extractors::identity::CallerIdentity;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Pagination query parameters shared by the listing endpoints.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl From<PageQuery> for Page {
    fn from(query: PageQuery) -> Self {
        Page {
            limit: query.limit,
            offset: query.offset,
        }
    }
}

/// POST /api/v1/users - Register a user.
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if body.username.trim().is_empty() {
        return Err(AppError::Validation("username must not be empty".to_string()));
    }

    let user = state.user_service.create_user(body).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(user, request_id, elapsed)))
}

/// GET /api/v1/users - List active users.
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<User>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let users = state.user_service.list_users(query.into()).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(users, request_id, elapsed)))
}

/// GET /api/v1/users/:id - Fetch one user.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let user = state.user_service.get_user(&UserId::from_uuid(id)).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(user, request_id, elapsed)))
}

/// PUT /api/v1/users/:id - Update the caller's own profile.
pub async fn update_user(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = UserId::from_uuid(id);
    if caller != id {
        return Err(AppError::Unauthorized(
            "users may only update their own profile".to_string(),
        ));
    }

    let user = state.user_service.update_user(&id, body).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(user, request_id, elapsed)))
}

/// DELETE /api/v1/users/:id - Soft-delete the caller's own account.
pub async fn delete_user(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = UserId::from_uuid(id);
    if caller != id {
        return Err(AppError::Unauthorized(
            "users may only delete their own account".to_string(),
        ));
    }

    state.user_service.delete_user(&id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        serde_json::json!({"deleted": true}),
        request_id,
        elapsed,
    )))
}
