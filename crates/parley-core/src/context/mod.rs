//! Agent context assembly and condensing.
//!
//! A context is an ordered [`ContextEntry`](parley_types::agent::ContextEntry)
//! sequence built from a conversation's recent messages. The builder keeps
//! chronological order and splices forwarded histories in place; the
//! condenser bounds the sequence length by summarizing its oldest segment.

pub mod builder;
pub mod codec;
pub mod condenser;

pub use builder::build_context;
pub use condenser::HistoryCondenser;
