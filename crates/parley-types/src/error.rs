use thiserror::Error;

use crate::bot::ProviderKind;

/// Errors related to message validation and operations.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("message must have exactly one sender, got none")]
    MissingSender,

    #[error("message must have exactly one sender, got both a user and a bot")]
    ConflictingSender,

    #[error("message content is empty")]
    EmptyContent,

    #[error("message content too long: {actual} chars (max {max})")]
    ContentTooLong { max: usize, actual: usize },

    #[error("message not found")]
    NotFound,

    #[error("only the sender may modify a message")]
    NotSender,

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors related to bot configuration and operations.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("bot not found")]
    NotFound,

    #[error("bot name '{0}' already exists")]
    NameConflict(String),

    #[error("temperature {0} out of range (scaled 0-200)")]
    InvalidTemperature(i32),

    #[error("provider '{0}' requires an api key")]
    MissingApiKey(ProviderKind),

    #[error("invalid provider configuration: {0}")]
    InvalidProviderConfig(String),

    #[error("only the creator may modify a bot")]
    NotCreator,

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors related to user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,

    #[error("username or email already exists")]
    Conflict,

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors related to conversation operations.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("conversation not found")]
    NotFound,

    #[error("participant already present")]
    ParticipantExists,

    #[error("participant not found")]
    ParticipantNotFound,

    #[error("only the owner may modify a conversation")]
    NotOwner,

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_error_display() {
        let err = MessageError::ContentTooLong {
            max: 2000,
            actual: 2101,
        };
        assert!(err.to_string().contains("2101"));
        assert!(err.to_string().contains("2000"));
    }

    #[test]
    fn test_bot_error_display() {
        let err = BotError::MissingApiKey(ProviderKind::OpenAi);
        assert_eq!(err.to_string(), "provider 'openai' requires an api key");
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }
}
