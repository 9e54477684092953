//! User repository trait definition.

use parley_types::error::RepositoryError;
use parley_types::id::UserId;
use parley_types::user::User;

use super::Page;

/// Repository trait for user persistence.
pub trait UserRepository: Send + Sync {
    /// Create a new user. Returns `Conflict` when the username or email
    /// is taken.
    fn create(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a user by id.
    fn get_by_id(
        &self,
        id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Get a user by username.
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// List active users, newest first.
    fn list(
        &self,
        page: Page,
    ) -> impl std::future::Future<Output = Result<Vec<User>, RepositoryError>> + Send;

    /// Update a user row.
    fn update(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Soft-delete a user. Returns `true` if the row existed and was active.
    fn soft_delete(
        &self,
        id: &UserId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
