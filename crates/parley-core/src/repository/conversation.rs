//! Conversation repository trait definition.

use parley_types::conversation::{Actor, Conversation, Participant};
use parley_types::error::RepositoryError;
use parley_types::id::{ConversationId, UserId};

use super::Page;

/// Repository trait for conversations and their participant rows.
pub trait ConversationRepository: Send + Sync {
    /// Create a new conversation.
    fn create(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a conversation by id.
    fn get_by_id(
        &self,
        id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// List active conversations a user participates in, newest first.
    fn list_for_user(
        &self,
        user_id: &UserId,
        page: Page,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;

    /// Update a conversation row.
    fn update(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Soft-delete a conversation AND its messages.
    ///
    /// Returns `true` if the conversation existed and was active. Message
    /// lifecycle cascades from the conversation, so both flips happen in
    /// one transaction.
    fn soft_delete(
        &self,
        id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Add a participant. Returns `Conflict` if the actor is already in
    /// the conversation.
    fn add_participant(
        &self,
        participant: &Participant,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Remove a participant. Returns `true` if the row existed.
    fn remove_participant(
        &self,
        conversation_id: &ConversationId,
        actor: &Actor,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// List a conversation's participants in join order.
    fn list_participants(
        &self,
        conversation_id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<Vec<Participant>, RepositoryError>> + Send;
}
