//! Agent construction, caching, and invocation.

pub mod invoker;

pub use invoker::{AgentInvoker, ProviderFactory};
