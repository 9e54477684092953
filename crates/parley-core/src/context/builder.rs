//! Conversation context assembly.

use parley_types::agent::ContextEntry;
use parley_types::message::Message;

/// Build the ordered agent input sequence for a triggering message.
///
/// `prior` is the bounded window of earlier messages, chronological
/// oldest-first; `new_message` is the triggering message and lands at the
/// end. When a system prompt is present it becomes a single leading entry.
///
/// A message carrying a forwarded history splices its recorded entries in
/// place of the message -- the stored context supersedes re-deriving it --
/// while every other message becomes one user entry wrapping its text.
/// Relative order is preserved throughout.
pub fn build_context(
    prior: &[Message],
    new_message: &Message,
    system_prompt: Option<&str>,
) -> Vec<ContextEntry> {
    let mut entries = Vec::with_capacity(prior.len() + 2);

    if let Some(prompt) = system_prompt {
        entries.push(ContextEntry::system(prompt));
    }

    for message in prior.iter().chain(std::iter::once(new_message)) {
        match &message.forwarded_history {
            Some(history) if !history.is_empty() => {
                entries.extend(history.iter().cloned());
            }
            _ => entries.push(ContextEntry::user(&message.content)),
        }
    }

    entries
}
