//! User management service.

use parley_types::error::{RepositoryError, UserError};
use parley_types::id::UserId;
use parley_types::user::{CreateUserRequest, UpdateUserRequest, User};

use crate::repository::user::UserRepository;
use crate::repository::Page;

/// Thin validation and orchestration over [`UserRepository`].
pub struct UserService<U: UserRepository> {
    repo: U,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(repo: U) -> Self {
        Self { repo }
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, UserError> {
        let user = User::new(request.username, request.email, request.full_name);
        self.repo.create(&user).await.map_err(map_repo_err)?;
        Ok(user)
    }

    pub async fn get_user(&self, id: &UserId) -> Result<User, UserError> {
        self.repo
            .get_by_id(id)
            .await
            .map_err(map_repo_err)?
            .ok_or(UserError::NotFound)
    }

    pub async fn list_users(&self, page: Page) -> Result<Vec<User>, UserError> {
        self.repo.list(page).await.map_err(map_repo_err)
    }

    pub async fn update_user(
        &self,
        id: &UserId,
        request: UpdateUserRequest,
    ) -> Result<User, UserError> {
        let mut user = self.get_user(id).await?;
        if let Some(email) = request.email {
            user.email = email;
        }
        if let Some(full_name) = request.full_name {
            user.full_name = full_name;
        }
        user.updated_at = chrono::Utc::now();
        self.repo.update(&user).await.map_err(map_repo_err)?;
        Ok(user)
    }

    pub async fn delete_user(&self, id: &UserId) -> Result<(), UserError> {
        let removed = self.repo.soft_delete(id).await.map_err(map_repo_err)?;
        if removed { Ok(()) } else { Err(UserError::NotFound) }
    }
}

fn map_repo_err(err: RepositoryError) -> UserError {
    match err {
        RepositoryError::Conflict(_) => UserError::Conflict,
        RepositoryError::NotFound => UserError::NotFound,
        other => UserError::Storage(other.to_string()),
    }
}
