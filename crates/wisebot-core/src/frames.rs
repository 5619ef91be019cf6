//! Wire frames exchanged over the realtime transport.
//!
//! Every frame is one JSON object discriminated by its `type` field.
//!
//! | Direction | `type` | Fields |
//! |-----------|--------|--------|
//! | client → server | `user` | `message` |
//! | server → client | `assistant` | `message`, `confidence?`, `context_count?` |
//! | server → client | `typing` | (presence alone means active) |
//! | server → client | `system` | `message` |
//! | server → client | `error` | `message` |
//!
//! Extra fields (`timestamp`, `user_id`, ...) are ignored. Frames with a
//! `type` this client does not handle (such as the server's echo of the
//! user's own message) decode to [`InboundFrame::Unknown`].

use serde::{Deserialize, Serialize};

/// Fallback text for an `error` frame that carries no message.
pub const DEFAULT_ERROR_TEXT: &str = "WebSocket error occurred";

// ─────────────────────────────────────────────────────────────────────────────
// Outbound
// ─────────────────────────────────────────────────────────────────────────────

/// Frame sent from the client to the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundFrame {
    /// A chat message typed by the user.
    User {
        /// Message text.
        message: String,
    },
}

impl OutboundFrame {
    /// Build a `user` frame.
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Serialize to the JSON text sent on the wire.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inbound
// ─────────────────────────────────────────────────────────────────────────────

/// Frame received from the server, as decoded from JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundFrame {
    /// Assistant answer.
    Assistant {
        /// Answer text.
        message: String,
        /// Retrieval confidence reported by the backend.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<f64>,
        /// Number of knowledge chunks used to build the answer.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context_count: Option<u32>,
    },
    /// The assistant started composing an answer.
    Typing {
        /// Explicit activity flag; absent means active.
        #[serde(default = "default_active")]
        active: bool,
    },
    /// Informational notice from the server.
    System {
        /// Notice text.
        #[serde(default)]
        message: Option<String>,
    },
    /// Server-side error report.
    Error {
        /// Error text.
        #[serde(default)]
        message: Option<String>,
    },
    /// Any other `type` value.
    #[serde(other)]
    Unknown,
}

fn default_active() -> bool {
    true
}

impl InboundFrame {
    /// Decode one raw text frame.
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Classify into an [`InboundEvent`], or `None` for unhandled types.
    pub fn into_event(self) -> Option<InboundEvent> {
        match self {
            Self::Assistant {
                message,
                confidence,
                context_count,
            } => Some(InboundEvent::AssistantReply {
                text: message,
                confidence,
                context_count,
            }),
            Self::Typing { active } => Some(InboundEvent::TypingSignal { active }),
            Self::System { message } => Some(InboundEvent::SystemNotice {
                text: message.unwrap_or_default(),
            }),
            Self::Error { message } => Some(InboundEvent::TransportError {
                text: message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| DEFAULT_ERROR_TEXT.to_owned()),
            }),
            Self::Unknown => None,
        }
    }
}

/// Classified inbound event, ready for dispatch.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundEvent {
    /// Assistant answer.
    AssistantReply {
        /// Answer text.
        text: String,
        /// Retrieval confidence.
        confidence: Option<f64>,
        /// Number of knowledge chunks used.
        context_count: Option<u32>,
    },
    /// Typing indicator change.
    TypingSignal {
        /// Whether the assistant is composing.
        active: bool,
    },
    /// Server notice (may be empty when the frame had no message).
    SystemNotice {
        /// Notice text.
        text: String,
    },
    /// Error reported by the server or raised by the connection client.
    TransportError {
        /// Error text.
        text: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
