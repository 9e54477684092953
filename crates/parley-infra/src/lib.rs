//! Infrastructure implementations for Parley.
//!
//! SQLite persistence (sqlx, split reader/writer pools in WAL mode),
//! LLM provider backends (OpenAI-compatible, Azure OpenAI, Anthropic),
//! and configuration loading.

pub mod config;
pub mod llm;
pub mod sqlite;
