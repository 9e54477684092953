//! Forwarded-history blob encoding.
//!
//! A context sequence serializes to a UTF-8 JSON array. This is the format
//! stored in the messages table's `forwarded_history` column, so the
//! round-trip must reproduce kind, order, and text exactly.

use parley_types::agent::ContextEntry;
use parley_types::error::MessageError;

/// Serialize a context sequence to its JSON array form.
pub fn serialize_entries(entries: &[ContextEntry]) -> Result<String, MessageError> {
    serde_json::to_string(entries)
        .map_err(|e| MessageError::Storage(format!("serialize context entries: {e}")))
}

/// Deserialize a JSON array back into a context sequence.
///
/// An empty or blank string yields an empty sequence, matching a row
/// whose blob column was never written.
pub fn deserialize_entries(blob: &str) -> Result<Vec<ContextEntry>, MessageError> {
    if blob.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(blob)
        .map_err(|e| MessageError::Storage(format!("deserialize context entries: {e}")))
}
