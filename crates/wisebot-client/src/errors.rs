//! Error types for the realtime client.

use thiserror::Error;
use wisebot_core::errors::FailureKind;

/// Errors from the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The WebSocket handshake or TCP connect failed.
    #[error("websocket open failed: {0}")]
    Open(#[from] tokio_tungstenite::tungstenite::Error),
    /// The open did not complete within the configured timeout.
    #[error("open timed out after {0} ms")]
    Timeout(u64),
    /// Any other connector failure (used by non-WebSocket connectors).
    #[error("{0}")]
    Other(String),
}

/// Errors returned by [`ConnectionClient::connect`](crate::connection::ConnectionClient::connect).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport could not be opened; an automatic retry may be scheduled.
    #[error("failed to open {url}: {message}")]
    TransportOpen {
        /// Endpoint that failed.
        url: String,
        /// Underlying failure text.
        message: String,
    },
    /// The retry budget is spent; only a fresh `connect` will try again.
    #[error("failed to connect after {attempts} attempts")]
    RetriesExhausted {
        /// Attempts made in the failed chain.
        attempts: u32,
    },
    /// An in-flight attempt this call was waiting on did not succeed.
    #[error("connection attempt did not succeed")]
    ConnectionFailed,
    /// The attempt was superseded by `disconnect` or a new identity.
    #[error("connection attempt cancelled")]
    Cancelled,
}

impl ClientError {
    /// Failure classification.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::TransportOpen { .. } | Self::ConnectionFailed | Self::Cancelled => {
                FailureKind::TransportOpenFailure
            }
            Self::RetriesExhausted { .. } => FailureKind::AbnormalClose,
        }
    }

    /// Whether automatic recovery has stopped.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }
}

/// Message rejected before reaching the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Nothing left after trimming.
    #[error("message is empty")]
    Empty,
    /// Trimmed text longer than the allowed maximum.
    #[error("message is too long ({len} characters, maximum {max})")]
    TooLong {
        /// Trimmed length in characters.
        len: usize,
        /// Allowed maximum.
        max: usize,
    },
}

/// Errors from the chat state controller.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Input validation failed; nothing was sent or recorded.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The client is not connected.
    #[error("Not connected to server")]
    NotConnected,
    /// The transport refused the frame.
    #[error("Failed to send message")]
    SendFailed,
    /// Connecting failed.
    #[error(transparent)]
    Connect(#[from] ClientError),
}

impl ChatError {
    /// Failure classification.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::ValidationFailure,
            Self::NotConnected | Self::SendFailed => FailureKind::SendWhileDisconnected,
            Self::Connect(e) => e.kind(),
        }
    }
}

/// Errors from identity storage.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Reading or writing the identity file failed.
    #[error("identity storage error: {0}")]
    Io(#[from] std::io::Error),
    /// A caller-supplied identity is not a valid path segment.
    #[error("invalid identity {0:?}")]
    Invalid(String),
}
