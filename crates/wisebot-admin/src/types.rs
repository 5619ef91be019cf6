//! Request and response bodies of the ingestion endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used when manual text is submitted without one.
pub const DEFAULT_TEXT_TITLE: &str = "Manual Text Input";

/// `POST /upload/` response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    /// Server confirmation text.
    pub message: String,
}

/// `POST /upload/process` and `POST /upload/process-text` response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ProcessResponse {
    /// Knowledge chunks created from the input.
    pub chunks_created: u32,
    /// Optional server message.
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /upload/process-async` response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ProcessingTicket {
    /// Handle for [`processing_status`](crate::AdminClient::processing_status).
    pub processing_id: String,
    /// Initial state.
    pub status: ProcessingState,
}

/// Background processing state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingState {
    /// Stored, not yet picked up.
    Uploaded,
    /// Extraction and indexing running.
    Processing,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Error,
}

impl ProcessingState {
    /// Whether no further change will happen.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// `GET /upload/status/{id}` response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ProcessingStatus {
    /// Processing ID.
    pub processing_id: String,
    /// Current state.
    pub status: ProcessingState,
    /// Progress or error text.
    #[serde(default)]
    pub message: Option<String>,
    /// Chunks created, once completed.
    #[serde(default)]
    pub chunks_created: Option<u32>,
}

/// `POST /upload/process-text` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TextInput<'a> {
    /// Text to index.
    pub text: &'a str,
    /// Document title.
    pub title: &'a str,
}

/// `POST /chat/` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatRequest<'a> {
    /// User message.
    pub message: &'a str,
    /// Session identity.
    pub user_id: &'a str,
}

/// One stored document.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FileEntry {
    /// File name on the server.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    /// Modification time, Unix seconds.
    pub modified: f64,
}

impl FileEntry {
    /// Modification time as a timestamp.
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        if !self.modified.is_finite() {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        let millis = (self.modified * 1000.0).round() as i64;
        DateTime::from_timestamp_millis(millis)
    }
}

/// `GET /upload/list` response.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct FileList {
    /// Stored documents.
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

/// Human-readable size: `0 Bytes`, `1.5 KB`, `10 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_owned();
    }
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    let text = format!("{rounded:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text} {}", UNITS[unit])
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
