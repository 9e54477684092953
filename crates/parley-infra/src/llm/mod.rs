//! LLM provider implementations.
//!
//! - [`openai_compat`]: any OpenAI-compatible chat completions API
//!   (OpenAI, DeepSeek, custom base URLs) via `async_openai`.
//! - [`azure`]: Azure OpenAI with explicit endpoint/version/deployment
//!   wiring, also via `async_openai`.
//! - [`anthropic`]: the Anthropic Messages API via `reqwest`.
//! - [`factory`]: dispatch from a bot's typed provider settings to a
//!   constructed provider.

pub mod anthropic;
pub mod azure;
pub mod factory;
pub mod openai_compat;

pub use factory::DefaultProviderFactory;
