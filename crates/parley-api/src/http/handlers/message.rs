//! Message handlers, including the bot trigger entry point.
//!
//! Posting a message persists the human turn and runs trigger detection;
//! when a bot responds, the reply rides back in the same response body.
//! Bot replies are persisted server-side only -- there is no endpoint for
//! posting a bot-authored message, which keeps trigger evaluation pinned
//! to the human path.

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use parley_core::service::message::PostOutcome;
use parley_types::id::{ConversationId, MessageId};
use parley_types::message::{CreateMessageRequest, Message, UpdateMessageRequest};

use crate::http::error::AppError;
use crate::http::extractors::identity::CallerIdentity;
use crate::http::handlers::user::PageQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/conversations/:id/messages - Post a human message and
/// run the trigger pipeline.
pub async fn post_message(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateMessageRequest>,
) -> Result<Json<ApiResponse<PostOutcome>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let outcome = state
        .message_service
        .post_user_message(ConversationId::from_uuid(id), caller, body.content)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(outcome, request_id, elapsed)))
}

/// GET /api/v1/conversations/:id/messages - List messages newest-first.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let messages = state
        .message_service
        .list_messages(&ConversationId::from_uuid(id), query.into())
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(messages, request_id, elapsed)))
}

/// PUT /api/v1/messages/:id - Edit a message (sender only).
pub async fn update_message(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateMessageRequest>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let message = state
        .message_service
        .update_message(
            &MessageId::from_uuid(id),
            caller,
            body.content,
            body.is_active,
        )
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(message, request_id, elapsed)))
}

/// DELETE /api/v1/messages/:id - Soft-delete a message (sender only).
pub async fn delete_message(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    state
        .message_service
        .delete_message(&MessageId::from_uuid(id), caller)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        serde_json::json!({"deleted": true}),
        request_id,
        elapsed,
    )))
}
