use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::id::{BotId, ConversationId, UserId};

/// An ordered container of messages with a participant list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub description: Option<String>,
    pub created_by: UserId,
    /// Soft-delete flag. Deactivating a conversation deactivates its
    /// messages as well.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Construct a fresh active conversation.
    pub fn new(title: String, description: Option<String>, created_by: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            title,
            description,
            created_by,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Role of a participant within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Owner,
    Participant,
    Bot,
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantRole::Owner => write!(f, "owner"),
            ParticipantRole::Participant => write!(f, "participant"),
            ParticipantRole::Bot => write!(f, "bot"),
        }
    }
}

impl FromStr for ParticipantRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(ParticipantRole::Owner),
            "participant" => Ok(ParticipantRole::Participant),
            "bot" => Ok(ParticipantRole::Bot),
            other => Err(format!("invalid participant role: '{other}'")),
        }
    }
}

/// The actor side of a participant row: a human XOR a bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Actor {
    User(UserId),
    Bot(BotId),
}

/// Membership of a user or bot in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub conversation_id: ConversationId,
    pub actor: Actor,
    pub role: ParticipantRole,
    pub joined_at: DateTime<Utc>,
}

/// Request payload for creating a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    pub title: String,
    pub description: Option<String>,
}

/// Request payload for updating a conversation. All fields optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateConversationRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Request payload for adding a participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddParticipantRequest {
    #[serde(flatten)]
    pub actor: Actor,
    pub role: Option<ParticipantRole>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_role_roundtrip() {
        for role in [
            ParticipantRole::Owner,
            ParticipantRole::Participant,
            ParticipantRole::Bot,
        ] {
            let s = role.to_string();
            let parsed: ParticipantRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_actor_serde_tagging() {
        let actor = Actor::Bot(BotId::new());
        let json = serde_json::to_string(&actor).unwrap();
        assert!(json.contains("\"type\":\"bot\""));
        let parsed: Actor = serde_json::from_str(&json).unwrap();
        assert_eq!(actor, parsed);
    }
}
