//! Conversation and participant handlers.

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use parley_types::conversation::{
    Actor, AddParticipantRequest, Conversation, CreateConversationRequest, Participant,
    UpdateConversationRequest,
};
use parley_types::id::{BotId, ConversationId, UserId};

use crate::http::error::AppError;
use crate::http::extractors::identity::CallerIdentity;
use crate::http::handlers::user::PageQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/conversations - Create a conversation owned by the caller.
pub async fn create_conversation(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Json(body): Json<CreateConversationRequest>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if body.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }

    let conversation = state
        .conversation_service
        .create_conversation(caller, body)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(conversation, request_id, elapsed)))
}

/// GET /api/v1/conversations - List the caller's conversations.
pub async fn list_conversations(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Conversation>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let conversations = state
        .conversation_service
        .list_for_user(&caller, query.into())
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(conversations, request_id, elapsed)))
}

/// GET /api/v1/conversations/:id - Fetch one conversation.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let conversation = state
        .conversation_service
        .get_conversation(&ConversationId::from_uuid(id))
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(conversation, request_id, elapsed)))
}

/// PUT /api/v1/conversations/:id - Update title/description (owner only).
pub async fn update_conversation(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateConversationRequest>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let conversation = state
        .conversation_service
        .update_conversation(&ConversationId::from_uuid(id), caller, body)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(conversation, request_id, elapsed)))
}

/// DELETE /api/v1/conversations/:id - Soft-delete a conversation and its
/// messages (owner only).
pub async fn delete_conversation(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    state
        .conversation_service
        .delete_conversation(&ConversationId::from_uuid(id), caller)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        serde_json::json!({"deleted": true}),
        request_id,
        elapsed,
    )))
}

/// POST /api/v1/conversations/:id/participants - Add a participant.
pub async fn add_participant(
    State(state): State<AppState>,
    CallerIdentity(_caller): CallerIdentity,
    Path(id): Path<Uuid>,
    Json(body): Json<AddParticipantRequest>,
) -> Result<Json<ApiResponse<Participant>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let participant = state
        .conversation_service
        .add_participant(&ConversationId::from_uuid(id), body)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(participant, request_id, elapsed)))
}

/// GET /api/v1/conversations/:id/participants - List participants.
pub async fn list_participants(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Participant>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let participants = state
        .conversation_service
        .list_participants(&ConversationId::from_uuid(id))
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(participants, request_id, elapsed)))
}

/// DELETE /api/v1/conversations/:id/participants/:kind/:actor_id -
/// Remove a participant ("user" or "bot" kind).
pub async fn remove_participant(
    State(state): State<AppState>,
    CallerIdentity(_caller): CallerIdentity,
    Path((id, kind, actor_id)): Path<(Uuid, String, Uuid)>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let actor = match kind.as_str() {
        "user" => Actor::User(UserId::from_uuid(actor_id)),
        "bot" => Actor::Bot(BotId::from_uuid(actor_id)),
        other => {
            return Err(AppError::Validation(format!(
                "participant kind must be 'user' or 'bot', got '{other}'"
            )));
        }
    };

    state
        .conversation_service
        .remove_participant(&ConversationId::from_uuid(id), &actor)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        serde_json::json!({"removed": true}),
        request_id,
        elapsed,
    )))
}
