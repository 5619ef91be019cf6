//! Local checks run before any request is made.

use std::path::Path;

use crate::errors::{AdminError, Result};

/// Accepted document extensions and their MIME types.
pub const DOCUMENT_TYPES: [(&str, &str); 4] = [
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("txt", "text/plain"),
];

/// MIME type for `path`, or a validation error for unsupported extensions.
pub fn document_mime(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    DOCUMENT_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .ok_or_else(|| {
            AdminError::Validation("Please select a PDF, Word document, or text file".into())
        })
}

/// Reject documents over `max_bytes`.
pub fn check_document_size(size: u64, max_bytes: u64) -> Result<()> {
    if size > max_bytes {
        return Err(AdminError::Validation(format!(
            "File size must be at most {} ({size} bytes given)",
            crate::types::format_file_size(max_bytes)
        )));
    }
    Ok(())
}

/// Reject blank or oversized manual text.
pub fn check_text(text: &str, max_bytes: usize) -> Result<()> {
    if text.trim().is_empty() {
        return Err(AdminError::Validation(
            "Please enter some text to process".into(),
        ));
    }
    if text.len() > max_bytes {
        return Err(AdminError::Validation(format!(
            "Text is too large ({} bytes, maximum {max_bytes})",
            text.len()
        )));
    }
    Ok(())
}
