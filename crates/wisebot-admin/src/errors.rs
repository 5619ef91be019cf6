//! Admin client error types.

/// Errors from the document-ingestion client.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// Transport failure or timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading a local document failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Response body did not match the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with a non-2xx status.
    #[error("server returned {status}: {detail}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// `detail` field of the error body, or the raw body.
        detail: String,
    },

    /// Input rejected locally; no request was made.
    #[error("{0}")]
    Validation(String),

    /// Background processing reported an error.
    #[error("processing {id} failed: {message}")]
    ProcessingFailed {
        /// Processing ID.
        id: String,
        /// Server message.
        message: String,
    },

    /// Processing did not finish within the poll budget.
    #[error("processing {id} still running after {polls} polls")]
    PollTimeout {
        /// Processing ID.
        id: String,
        /// Polls made.
        polls: u32,
    },

    /// Polling was cancelled.
    #[error("cancelled")]
    Cancelled,
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AdminError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display() {
        let err = AdminError::Status {
            status: 400,
            detail: "Only PDF, DOCX, and TXT files are supported".into(),
        };
        assert_eq!(
            err.to_string(),
            "server returned 400: Only PDF, DOCX, and TXT files are supported"
        );
    }

    #[test]
    fn poll_timeout_display() {
        let err = AdminError::PollTimeout {
            id: "abc".into(),
            polls: 3,
        };
        assert_eq!(err.to_string(), "processing abc still running after 3 polls");
    }
}
