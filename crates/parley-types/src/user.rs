use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// A human user of the chat backend.
///
/// Authentication is out of scope: callers present an already-resolved
/// `UserId`, so there is no credential material here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Unique handle used in @mentions.
    pub username: String,
    pub email: String,
    pub full_name: String,
    /// Soft-delete flag; inactive users are hidden from listings.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Construct a fresh active user with generated id and timestamps.
    pub fn new(username: String, email: String, full_name: String) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            username,
            email,
            full_name,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request payload for creating a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
}

/// Request payload for updating a user. All fields optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_is_active() {
        let user = User::new(
            "alice".to_string(),
            "alice@example.com".to_string(),
            "Alice Example".to_string(),
        );
        assert!(user.is_active);
        assert_eq!(user.created_at, user.updated_at);
    }
}
