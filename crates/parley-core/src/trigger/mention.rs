//! @mention extraction from raw message text.

/// Extract `@name` tokens from message content.
///
/// A mention is `@` followed by one or more word characters (letters,
/// digits, underscore) or hyphens -- the canonical pattern; bot handles
/// may contain hyphens. The leading `@` is stripped, case is preserved,
/// and duplicates are removed keeping the first occurrence. A bare `@`
/// with no token is ignored.
pub fn extract_mentions(content: &str) -> Vec<String> {
    let mut mentions: Vec<String> = Vec::new();
    let mut chars = content.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '@' {
            continue;
        }
        let mut token = String::new();
        while let Some(&(_, next)) = chars.peek() {
            if is_mention_char(next) {
                token.push(next);
                chars.next();
            } else {
                break;
            }
        }
        if !token.is_empty() && !mentions.iter().any(|m| m == &token) {
            mentions.push(token);
        }
    }

    mentions
}

fn is_mention_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}
