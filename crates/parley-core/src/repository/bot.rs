//! Bot repository trait definition.

use parley_types::bot::Bot;
use parley_types::error::RepositoryError;
use parley_types::id::BotId;

use super::Page;

/// Repository trait for bot persistence.
///
/// Implementations live in parley-infra (e.g. SqliteBotRepository).
pub trait BotRepository: Send + Sync {
    /// Create a new bot. Returns `Conflict` when the name is taken.
    fn create(
        &self,
        bot: &Bot,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a bot by id.
    fn get_by_id(
        &self,
        id: &BotId,
    ) -> impl std::future::Future<Output = Result<Option<Bot>, RepositoryError>> + Send;

    /// Get an active bot by its unique name.
    fn get_by_name(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<Bot>, RepositoryError>> + Send;

    /// List active bots, newest first.
    fn list(
        &self,
        page: Page,
    ) -> impl std::future::Future<Output = Result<Vec<Bot>, RepositoryError>> + Send;

    /// All active bots ordered by id ascending.
    ///
    /// The ordering is load-bearing: the default selection policy picks
    /// the earliest-created (lowest v7 id) bot.
    fn list_active(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Bot>, RepositoryError>> + Send;

    /// Update a bot row.
    fn update(
        &self,
        bot: &Bot,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Soft-delete a bot. Returns `true` if the row existed and was active.
    fn soft_delete(
        &self,
        id: &BotId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
