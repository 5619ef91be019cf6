//! Failure taxonomy shared by the client crates.
//!
//! [`FailureKind`] is not an error type itself. Concrete error enums
//! (`ClientError`, `ChatError`, ...) map onto it via their `kind()` methods,
//! and log lines carry it as a structured `kind` field so every failure can be
//! grouped the same way regardless of which layer reported it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of every failure the realtime client can observe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The transport could not be opened (refused, timed out, handshake error).
    TransportOpenFailure,
    /// An open transport closed with a code other than normal closure.
    AbnormalClose,
    /// An inbound frame was not valid JSON or did not match any frame shape.
    MalformedInboundFrame,
    /// A send was attempted while not connected.
    SendWhileDisconnected,
    /// User input was rejected before reaching the transport.
    ValidationFailure,
}

impl FailureKind {
    /// Whether the failure can be recovered without user action.
    ///
    /// Abnormal closes are retried automatically and malformed frames are
    /// dropped; the remaining kinds need a caller to act.
    #[must_use]
    pub fn is_self_healing(self) -> bool {
        matches!(self, Self::AbnormalClose | Self::MalformedInboundFrame)
    }

    /// Snake-case label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TransportOpenFailure => "transport_open_failure",
            Self::AbnormalClose => "abnormal_close",
            Self::MalformedInboundFrame => "malformed_inbound_frame",
            Self::SendWhileDisconnected => "send_while_disconnected",
            Self::ValidationFailure => "validation_failure",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
