//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`,
//! so a settings file may specify any subset of fields.

mod admin;
mod chat;
mod server;

pub use admin::*;
pub use chat::*;
pub use server::*;

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// ```json
/// {
///   "server": { "wsUrl": "wss://bot.example.com" },
///   "connection": { "maxReconnectAttempts": 3 }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WisebotSettings {
    /// Settings schema version.
    pub version: String,
    /// Backend endpoints.
    pub server: ServerSettings,
    /// Realtime connection behavior.
    pub connection: ConnectionSettings,
    /// Chat controller behavior.
    pub chat: ChatSettings,
    /// Identity storage.
    pub identity: IdentitySettings,
    /// HTTP admin client.
    pub admin: AdminSettings,
    /// Logging.
    pub logging: LoggingSettings,
}

impl Default for WisebotSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            server: ServerSettings::default(),
            connection: ConnectionSettings::default(),
            chat: ChatSettings::default(),
            identity: IdentitySettings::default(),
            admin: AdminSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl WisebotSettings {
    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> crate::errors::Result<()> {
        let invalid = |msg: &str| Err(crate::errors::SettingsError::InvalidValue(msg.into()));
        let ws = &self.server.ws_url;
        if !(ws.starts_with("ws://") || ws.starts_with("wss://")) {
            return invalid("server.wsUrl must use ws:// or wss://");
        }
        let http = &self.server.http_url;
        if !(http.starts_with("http://") || http.starts_with("https://")) {
            return invalid("server.httpUrl must use http:// or https://");
        }
        if self.connection.channel_capacity == 0 {
            return invalid("connection.channelCapacity must be positive");
        }
        if self.chat.max_message_chars == 0 {
            return invalid("chat.maxMessageChars must be positive");
        }
        Ok(())
    }
}
