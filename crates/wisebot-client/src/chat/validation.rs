//! Outgoing message validation.

use crate::errors::ValidationError;

/// Trim `text` and check it is non-empty and at most `max_chars` characters.
///
/// Returns the trimmed slice.
pub fn validate_message(text: &str, max_chars: usize) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    let len = trimmed.chars().count();
    if len > max_chars {
        return Err(ValidationError::TooLong {
            len,
            max: max_chars,
        });
    }
    Ok(trimmed)
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
