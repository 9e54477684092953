//! LLM provider abstractions.
//!
//! [`provider::LlmProvider`] is the capability every backend implements;
//! [`box_provider::BoxLlmProvider`] erases the concrete type so agents can
//! hold any backend at runtime. Implementations live in `parley-infra`.

pub mod box_provider;
pub mod provider;

pub use box_provider::BoxLlmProvider;
pub use provider::LlmProvider;
