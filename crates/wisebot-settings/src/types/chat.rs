//! Chat controller and identity settings.

use serde::{Deserialize, Serialize};
use wisebot_core::constants::MAX_MESSAGE_CHARS;

/// Chat state controller settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatSettings {
    /// Maximum trimmed length of an outgoing message, in characters.
    pub max_message_chars: usize,
    /// System notices containing any of these phrases are not shown.
    pub greeting_filters: Vec<String>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            max_message_chars: MAX_MESSAGE_CHARS,
            greeting_filters: vec!["Welcome".to_string(), "Knowledge base".to_string()],
        }
    }
}

/// Session identity storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentitySettings {
    /// Identity file path; `~/.wisebot/identity` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}
