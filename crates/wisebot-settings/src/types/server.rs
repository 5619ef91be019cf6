//! Server endpoints and realtime connection settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use wisebot_core::retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RECONNECT_DELAY_MS, ReconnectPolicy};

/// Backend endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Base URL of the realtime endpoint (`/ws/<identity>` is appended).
    pub ws_url: String,
    /// Base URL of the HTTP ingestion surface.
    pub http_url: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:8000".to_string(),
            http_url: "http://localhost:8000".to_string(),
        }
    }
}

/// Realtime connection behavior.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionSettings {
    /// Automatic reconnect attempts after the connection is lost.
    pub max_reconnect_attempts: u32,
    /// Fixed delay before each reconnect attempt, in milliseconds.
    pub reconnect_delay_ms: u64,
    /// Upper bound on a single transport open, in milliseconds.
    pub connect_timeout_ms: u64,
    /// Capacity of the outgoing and incoming frame channels.
    pub channel_capacity: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: DEFAULT_MAX_ATTEMPTS,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            connect_timeout_ms: 10_000,
            channel_capacity: 64,
        }
    }
}

impl ConnectionSettings {
    /// Reconnect policy derived from these settings.
    #[must_use]
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.max_reconnect_attempts,
            delay_ms: self.reconnect_delay_ms,
        }
    }

    /// Open timeout as a [`Duration`].
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_defaults() {
        let s = ServerSettings::default();
        assert_eq!(s.ws_url, "ws://localhost:8000");
        assert_eq!(s.http_url, "http://localhost:8000");
    }

    #[test]
    fn server_serde_camel_case() {
        let json = serde_json::to_value(ServerSettings::default()).unwrap();
        assert!(json.get("wsUrl").is_some());
        assert!(json.get("httpUrl").is_some());
    }

    #[test]
    fn connection_defaults() {
        let c = ConnectionSettings::default();
        assert_eq!(c.max_reconnect_attempts, 5);
        assert_eq!(c.reconnect_delay_ms, 1000);
        assert_eq!(c.connect_timeout(), Duration::from_secs(10));
        assert_eq!(c.channel_capacity, 64);
    }

    #[test]
    fn connection_partial_json() {
        let c: ConnectionSettings = serde_json::from_str(r#"{"reconnectDelayMs": 50}"#).unwrap();
        assert_eq!(c.reconnect_delay_ms, 50);
        assert_eq!(c.max_reconnect_attempts, 5);
    }

    #[test]
    fn reconnect_policy_mirrors_settings() {
        let c = ConnectionSettings {
            max_reconnect_attempts: 2,
            reconnect_delay_ms: 25,
            ..ConnectionSettings::default()
        };
        let policy = c.reconnect_policy();
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.delay(), Duration::from_millis(25));
    }

    #[test]
    fn logging_default_level() {
        assert_eq!(LoggingSettings::default().level, "warn");
    }
}
