//! Repository trait definitions ("ports").
//!
//! The infrastructure layer (parley-infra) implements these against
//! SQLite. All traits use native async fn in traits (Rust 2024 edition,
//! no async_trait macro).

pub mod bot;
pub mod conversation;
pub mod message;
pub mod user;

pub use bot::BotRepository;
pub use conversation::ConversationRepository;
pub use message::MessageRepository;
pub use user::UserRepository;

/// Offset/limit pagination for listing queries.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}
