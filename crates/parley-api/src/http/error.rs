//! Application error type mapping to HTTP status codes and the envelope
//! format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use parley_types::error::{BotError, ConversationError, MessageError, UserError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    User(UserError),
    Bot(BotError),
    Conversation(ConversationError),
    Message(MessageError),
    /// Missing or malformed caller identity.
    Unauthorized(String),
    /// Request body validation failure.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<UserError> for AppError {
    fn from(e: UserError) -> Self {
        AppError::User(e)
    }
}

impl From<BotError> for AppError {
    fn from(e: BotError) -> Self {
        AppError::Bot(e)
    }
}

impl From<ConversationError> for AppError {
    fn from(e: ConversationError) -> Self {
        AppError::Conversation(e)
    }
}

impl From<MessageError> for AppError {
    fn from(e: MessageError) -> Self {
        AppError::Message(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::User(UserError::NotFound) => {
                (StatusCode::NOT_FOUND, "USER_NOT_FOUND", "User not found".to_string())
            }
            AppError::User(UserError::Conflict) => (
                StatusCode::CONFLICT,
                "USER_CONFLICT",
                "Username or email already exists".to_string(),
            ),
            AppError::User(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "USER_ERROR", e.to_string())
            }
            AppError::Bot(BotError::NotFound) => {
                (StatusCode::NOT_FOUND, "BOT_NOT_FOUND", "Bot not found".to_string())
            }
            AppError::Bot(BotError::NameConflict(name)) => (
                StatusCode::CONFLICT,
                "BOT_NAME_CONFLICT",
                format!("Bot name '{name}' already exists"),
            ),
            AppError::Bot(e @ BotError::InvalidTemperature(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Bot(BotError::NotCreator) => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Only the creator may modify a bot".to_string(),
            ),
            AppError::Bot(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "BOT_ERROR", e.to_string())
            }
            AppError::Conversation(ConversationError::NotFound) => (
                StatusCode::NOT_FOUND,
                "CONVERSATION_NOT_FOUND",
                "Conversation not found".to_string(),
            ),
            AppError::Conversation(ConversationError::NotOwner) => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Only the owner may modify a conversation".to_string(),
            ),
            AppError::Conversation(ConversationError::ParticipantExists) => (
                StatusCode::CONFLICT,
                "PARTICIPANT_EXISTS",
                "Participant already present".to_string(),
            ),
            AppError::Conversation(ConversationError::ParticipantNotFound) => (
                StatusCode::NOT_FOUND,
                "PARTICIPANT_NOT_FOUND",
                "Participant not found".to_string(),
            ),
            AppError::Conversation(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONVERSATION_ERROR",
                e.to_string(),
            ),
            AppError::Message(MessageError::NotFound) => (
                StatusCode::NOT_FOUND,
                "MESSAGE_NOT_FOUND",
                "Message not found".to_string(),
            ),
            AppError::Message(MessageError::NotSender) => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Only the sender may modify a message".to_string(),
            ),
            AppError::Message(
                e @ (MessageError::EmptyContent
                | MessageError::ContentTooLong { .. }
                | MessageError::MissingSender
                | MessageError::ConflictingSender),
            ) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
            AppError::Message(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "MESSAGE_ERROR",
                e.to_string(),
            ),
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        };

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
