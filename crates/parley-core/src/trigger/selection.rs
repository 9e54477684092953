//! Bot selection policy for triggered messages.
//!
//! The evaluator only decides THAT a bot should respond; a
//! [`SelectionPolicy`] decides WHICH of the active bots gets the turn.
//! The trait exists so smarter policies (mention-specific targeting,
//! round-robin) can be swapped in without touching the pipeline.

use parley_types::bot::Bot;

/// Chooses one bot from the active set for a triggered message.
pub trait SelectionPolicy: Send + Sync {
    /// Select a bot from `bots`, which is ordered by id ascending.
    /// Returns `None` when no bot is eligible.
    fn select<'a>(&self, bots: &'a [Bot]) -> Option<&'a Bot>;
}

/// Default policy: the earliest-created active bot wins.
///
/// Ids are UUID v7, so "lowest id first" is "earliest created first" --
/// a named, deterministic rule rather than incidental iteration order.
/// Bots with `auto_trigger` disabled are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct EarliestCreated;

impl SelectionPolicy for EarliestCreated {
    fn select<'a>(&self, bots: &'a [Bot]) -> Option<&'a Bot> {
        bots.iter().filter(|b| b.auto_trigger).min_by_key(|b| b.id)
    }
}
