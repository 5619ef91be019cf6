//! Chat log entries.
//!
//! A [`Message`] is immutable once created: the chat log only ever appends
//! new entries or is replaced wholesale by an empty log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MessageId;

/// Who produced a chat log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Typed by the local user.
    User,
    /// Reply from the assistant backend.
    Assistant,
    /// Server notice that survived the greeting filter.
    System,
}

impl Origin {
    /// Lowercase label used in logs and the terminal front-end.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the ordered chat log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique, time-ordered identifier.
    pub id: MessageId,
    /// Producer of the entry.
    pub origin: Origin,
    /// Text content.
    pub content: String,
    /// Creation time.
    pub sent_at: DateTime<Utc>,
}

impl Message {
    /// Create a new entry stamped with the current time.
    pub fn new(origin: Origin, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            origin,
            content: content.into(),
            sent_at: Utc::now(),
        }
    }

    /// Shorthand for a [`Origin::User`] entry.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Origin::User, content)
    }

    /// Shorthand for a [`Origin::Assistant`] entry.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Origin::Assistant, content)
    }

    /// Shorthand for a [`Origin::System`] entry.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Origin::System, content)
    }
}
