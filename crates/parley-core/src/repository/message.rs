//! Message repository trait definition.

use parley_types::error::RepositoryError;
use parley_types::id::{ConversationId, MessageId};
use parley_types::message::Message;

use super::Page;

/// Repository trait for message persistence.
///
/// Implementations live in parley-infra (e.g. SqliteMessageRepository).
pub trait MessageRepository: Send + Sync {
    /// Persist a new message, including any forwarded-history blob.
    fn create(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a message by id.
    fn get_by_id(
        &self,
        id: &MessageId,
    ) -> impl std::future::Future<Output = Result<Option<Message>, RepositoryError>> + Send;

    /// Active messages in a conversation, newest first.
    fn list_for_conversation(
        &self,
        conversation_id: &ConversationId,
        page: Page,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// The context window: up to `limit` active messages strictly older
    /// than `before`, returned in chronological order (oldest first).
    ///
    /// "Older" is by id; v7 ids order by creation time, so this is the
    /// conversation prefix preceding the pivot message.
    fn recent_context(
        &self,
        conversation_id: &ConversationId,
        before: &MessageId,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Update a message row (content / active flag).
    fn update(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Soft-delete a message. Returns `true` if the row existed and was
    /// active.
    fn soft_delete(
        &self,
        id: &MessageId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
