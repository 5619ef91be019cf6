//! Branded ID newtypes for type safety.
//!
//! Each identifier is a newtype wrapper around `String`, so a message ID can
//! never be passed where a session identity is expected.
//!
//! - [`MessageId`]: UUID v7 (time-ordered), minted per chat log entry.
//! - [`SessionIdentity`]: the per-installation string that scopes a
//!   connection. It travels as a URL path segment, so construction from
//!   untrusted input goes through [`SessionIdentity::parse`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length of a session identity.
pub const MAX_IDENTITY_LEN: usize = 128;

const IDENTITY_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_id! {
    /// Unique identifier for one entry of the chat log.
    MessageId
}

branded_id! {
    /// Stable identifier of one client installation.
    ///
    /// Used as the single path segment of the realtime endpoint
    /// (`/ws/<identity>`); the server scopes all state to it.
    SessionIdentity
}

impl MessageId {
    /// Create a new ID (UUID v7, time-ordered).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionIdentity {
    /// Validate and wrap an identity string.
    ///
    /// Accepts 1–[`MAX_IDENTITY_LEN`] characters from `[A-Za-z0-9_-]`, which
    /// keeps the value safe to splice into a URL path without escaping.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let valid = !value.is_empty()
            && value.len() <= MAX_IDENTITY_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        valid.then(|| Self(value.to_owned()))
    }

    /// Fresh identity: `user_<unix micros>_<9 random base-36 chars>`.
    #[must_use]
    pub fn generate() -> Self {
        let micros = chrono::Utc::now().timestamp_micros();
        let mut rng = rand::rng();
        let suffix: String = (0..IDENTITY_SUFFIX_LEN)
            .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
            .collect();
        Self(format!("user_{micros}_{suffix}"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
