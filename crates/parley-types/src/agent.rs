//! Agent context entries -- the turn sequence fed to a language model.
//!
//! A context sequence is chronological: request kinds (system, user,
//! summary) and the response kind (assistant) interleave in the order they
//! occurred. The JSON array form of a sequence is the forwarded-history
//! blob stored on bot-authored messages, so serialization must round-trip
//! exactly.

use serde::{Deserialize, Serialize};

use crate::llm::MessageRole;

/// One turn in the sequence handed to a language-model agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContextEntry {
    /// Instructional preamble (request kind).
    System { content: String },
    /// A human turn (request kind).
    User { content: String },
    /// A condensed stand-in for older turns (request kind).
    Summary { content: String },
    /// A generated reply (response kind).
    Assistant { content: String },
}

impl ContextEntry {
    pub fn system(content: impl Into<String>) -> Self {
        ContextEntry::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ContextEntry::User {
            content: content.into(),
        }
    }

    pub fn summary(content: impl Into<String>) -> Self {
        ContextEntry::Summary {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ContextEntry::Assistant {
            content: content.into(),
        }
    }

    /// The text payload of this turn.
    pub fn content(&self) -> &str {
        match self {
            ContextEntry::System { content }
            | ContextEntry::User { content }
            | ContextEntry::Summary { content }
            | ContextEntry::Assistant { content } => content,
        }
    }

    /// Whether this is a request kind (anything the model did not say).
    pub fn is_request(&self) -> bool {
        !matches!(self, ContextEntry::Assistant { .. })
    }

    /// The chat role this entry maps to in a provider request.
    ///
    /// Summaries travel as user turns: they are input recounting prior
    /// conversation, not something the model said.
    pub fn role(&self) -> MessageRole {
        match self {
            ContextEntry::System { .. } => MessageRole::System,
            ContextEntry::User { .. } | ContextEntry::Summary { .. } => MessageRole::User,
            ContextEntry::Assistant { .. } => MessageRole::Assistant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serde_tagging() {
        let entry = ContextEntry::summary("earlier: decided on sqlite");
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"summary","content":"earlier: decided on sqlite"}"#
        );
        let parsed: ContextEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, parsed);
    }

    #[test]
    fn test_sequence_roundtrip_preserves_kind_order_content() {
        let seq = vec![
            ContextEntry::system("You are helpful."),
            ContextEntry::user("hello"),
            ContextEntry::assistant("hi there"),
            ContextEntry::summary("[Conversation Summary: greetings exchanged]"),
            ContextEntry::user("what next?"),
        ];
        let json = serde_json::to_string(&seq).unwrap();
        let parsed: Vec<ContextEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(seq, parsed);
    }

    #[test]
    fn test_request_response_split() {
        assert!(ContextEntry::system("s").is_request());
        assert!(ContextEntry::user("u").is_request());
        assert!(ContextEntry::summary("m").is_request());
        assert!(!ContextEntry::assistant("a").is_request());
    }

    #[test]
    fn test_role_mapping() {
        assert_eq!(ContextEntry::system("s").role(), MessageRole::System);
        assert_eq!(ContextEntry::user("u").role(), MessageRole::User);
        assert_eq!(ContextEntry::summary("m").role(), MessageRole::User);
        assert_eq!(ContextEntry::assistant("a").role(), MessageRole::Assistant);
    }
}
