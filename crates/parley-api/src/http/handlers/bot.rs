//! Bot CRUD handlers.

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use parley_types::bot::{Bot, CreateBotRequest, UpdateBotRequest};
use parley_types::id::BotId;

use crate::http::error::AppError;
use crate::http::extractors::identity::CallerIdentity;
use crate::http::handlers::user::PageQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/bots - Create a bot owned by the caller.
pub async fn create_bot(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Json(body): Json<CreateBotRequest>,
) -> Result<Json<ApiResponse<Bot>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if body.name.trim().is_empty() {
        return Err(AppError::Validation("bot name must not be empty".to_string()));
    }

    let bot = state.bot_service.create_bot(caller, body).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(bot, request_id, elapsed)))
}

/// GET /api/v1/bots - List active bots.
pub async fn list_bots(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Bot>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let bots = state.bot_service.list_bots(query.into()).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(bots, request_id, elapsed)))
}

/// GET /api/v1/bots/:id - Fetch one bot.
pub async fn get_bot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Bot>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let bot = state.bot_service.get_bot(&BotId::from_uuid(id)).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(bot, request_id, elapsed)))
}

/// PUT /api/v1/bots/:id - Update a bot (creator only).
pub async fn update_bot(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateBotRequest>,
) -> Result<Json<ApiResponse<Bot>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let bot = state
        .bot_service
        .update_bot(&BotId::from_uuid(id), caller, body)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(bot, request_id, elapsed)))
}

/// DELETE /api/v1/bots/:id - Soft-delete a bot (creator only).
pub async fn delete_bot(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    state
        .bot_service
        .delete_bot(&BotId::from_uuid(id), caller)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        serde_json::json!({"deleted": true}),
        request_id,
        elapsed,
    )))
}
