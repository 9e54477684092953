//! Shared domain types for Parley.
//!
//! This crate contains the core domain types used across the Parley chat
//! backend: User, Bot, Conversation, Message, the agent context entries fed
//! to language models, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod agent;
pub mod bot;
pub mod config;
pub mod conversation;
pub mod error;
pub mod id;
pub mod llm;
pub mod message;
pub mod user;
