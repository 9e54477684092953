use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::ContextEntry;
use crate::error::MessageError;
use crate::id::{BotId, ConversationId, MessageId, UserId};

/// Maximum message content length in characters.
pub const MAX_CONTENT_LEN: usize = 2000;

/// Who authored a message: a human XOR a bot, never both, never neither.
///
/// The two-variant enum makes the exclusive-or invariant unrepresentable
/// to violate in the domain; [`Sender::from_ids`] is the checked entry
/// point for the nullable-pair form used by the database and API bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Sender {
    User(UserId),
    Bot(BotId),
}

impl Sender {
    /// Build a sender from the raw nullable pair, enforcing exclusive-or.
    pub fn from_ids(
        user_id: Option<UserId>,
        bot_id: Option<BotId>,
    ) -> Result<Self, MessageError> {
        match (user_id, bot_id) {
            (Some(user), None) => Ok(Sender::User(user)),
            (None, Some(bot)) => Ok(Sender::Bot(bot)),
            (Some(_), Some(_)) => Err(MessageError::ConflictingSender),
            (None, None) => Err(MessageError::MissingSender),
        }
    }

    /// The user id, when human-authored.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Sender::User(id) => Some(*id),
            Sender::Bot(_) => None,
        }
    }

    /// The bot id, when bot-authored.
    pub fn bot_id(&self) -> Option<BotId> {
        match self {
            Sender::User(_) => None,
            Sender::Bot(id) => Some(*id),
        }
    }

    pub fn is_bot(&self) -> bool {
        matches!(self, Sender::Bot(_))
    }
}

/// One unit of conversation content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub content: String,
    pub sender: Sender,
    /// Structured agent history carried forward by bot-authored messages.
    /// Spliced verbatim into future context builds in place of the plain
    /// text content.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub forwarded_history: Option<Vec<ContextEntry>>,
    /// Soft-delete flag; inactive messages are excluded from listings and
    /// context windows.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// Construct a validated message.
    ///
    /// Rejects empty and oversized content before anything touches
    /// storage or a provider.
    pub fn new(
        conversation_id: ConversationId,
        sender: Sender,
        content: String,
    ) -> Result<Self, MessageError> {
        validate_content(&content)?;
        let now = Utc::now();
        Ok(Self {
            id: MessageId::new(),
            conversation_id,
            content,
            sender,
            forwarded_history: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Attach a forwarded agent history to a bot-authored message.
    pub fn with_forwarded_history(mut self, history: Vec<ContextEntry>) -> Self {
        self.forwarded_history = Some(history);
        self
    }
}

/// Validate message content length bounds.
pub fn validate_content(content: &str) -> Result<(), MessageError> {
    if content.is_empty() {
        return Err(MessageError::EmptyContent);
    }
    let len = content.chars().count();
    if len > MAX_CONTENT_LEN {
        return Err(MessageError::ContentTooLong {
            max: MAX_CONTENT_LEN,
            actual: len,
        });
    }
    Ok(())
}

/// Request payload for posting a message to a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    pub content: String,
}

/// Request payload for editing a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMessageRequest {
    pub content: Option<String>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_from_ids_user() {
        let user = UserId::new();
        let sender = Sender::from_ids(Some(user), None).unwrap();
        assert_eq!(sender, Sender::User(user));
        assert_eq!(sender.user_id(), Some(user));
        assert!(sender.bot_id().is_none());
    }

    #[test]
    fn test_sender_from_ids_bot() {
        let bot = BotId::new();
        let sender = Sender::from_ids(None, Some(bot)).unwrap();
        assert!(sender.is_bot());
        assert_eq!(sender.bot_id(), Some(bot));
    }

    #[test]
    fn test_sender_both_is_rejected() {
        let err = Sender::from_ids(Some(UserId::new()), Some(BotId::new())).unwrap_err();
        assert!(matches!(err, MessageError::ConflictingSender));
    }

    #[test]
    fn test_sender_neither_is_rejected() {
        let err = Sender::from_ids(None, None).unwrap_err();
        assert!(matches!(err, MessageError::MissingSender));
    }

    #[test]
    fn test_empty_content_rejected() {
        let err = Message::new(
            ConversationId::new(),
            Sender::User(UserId::new()),
            String::new(),
        )
        .unwrap_err();
        assert!(matches!(err, MessageError::EmptyContent));
    }

    #[test]
    fn test_oversized_content_rejected() {
        let err = Message::new(
            ConversationId::new(),
            Sender::User(UserId::new()),
            "x".repeat(MAX_CONTENT_LEN + 1),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MessageError::ContentTooLong { max: MAX_CONTENT_LEN, actual } if actual == MAX_CONTENT_LEN + 1
        ));
    }

    #[test]
    fn test_content_at_limit_accepted() {
        let msg = Message::new(
            ConversationId::new(),
            Sender::User(UserId::new()),
            "x".repeat(MAX_CONTENT_LEN),
        )
        .unwrap();
        assert!(msg.is_active);
        assert!(msg.forwarded_history.is_none());
    }
}
