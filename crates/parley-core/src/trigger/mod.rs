//! Trigger detection: deciding when a human message should provoke a bot.
//!
//! Detection is pure and runs only on the human-message path. Bot-authored
//! messages are never fed back through it, which is what prevents
//! bot-triggers-bot loops.

pub mod evaluator;
pub mod mention;
pub mod selection;

pub use evaluator::TriggerEvaluator;
pub use mention::extract_mentions;
pub use selection::{EarliestCreated, SelectionPolicy};

use parley_types::bot::BotConfig;

/// Ephemeral outcome of trigger detection: a bot should respond, and this
/// is its materialized configuration. Never persisted.
#[derive(Debug, Clone)]
pub struct TriggerDecision {
    pub bot: BotConfig,
}
