//! SQLite persistence layer.

pub mod bot;
pub mod conversation;
pub mod message;
pub mod pool;
pub mod user;

pub use pool::DatabasePool;
