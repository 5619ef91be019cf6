//! Document-ingestion client settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default maximum document size (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
/// Default maximum manual text size (5 MiB).
pub const DEFAULT_MAX_TEXT_BYTES: usize = 5 * 1024 * 1024;

/// HTTP admin client settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminSettings {
    /// Timeout for ordinary requests, in milliseconds.
    pub request_timeout_ms: u64,
    /// Timeout for multipart uploads, in milliseconds.
    pub upload_timeout_ms: u64,
    /// Delay between processing-status polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum number of status polls before giving up.
    pub max_polls: u32,
    /// Largest accepted document, in bytes.
    pub max_upload_bytes: u64,
    /// Largest accepted manual text, in bytes.
    pub max_text_bytes: usize,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            upload_timeout_ms: 60_000,
            poll_interval_ms: 1000,
            max_polls: 120,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_text_bytes: DEFAULT_MAX_TEXT_BYTES,
        }
    }
}

impl AdminSettings {
    /// Ordinary request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Upload request timeout.
    #[must_use]
    pub fn upload_timeout(&self) -> Duration {
        Duration::from_millis(self.upload_timeout_ms)
    }

    /// Delay between status polls.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
