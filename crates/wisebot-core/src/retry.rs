//! Reconnect policy.
//!
//! The connection client retries a failed or abnormally closed transport at a
//! fixed delay, up to a bounded number of attempts. This module holds the
//! portable parameters; scheduling lives in `wisebot-client`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default maximum number of automatic reconnect attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Default delay before each reconnect attempt, in milliseconds.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 1000;

/// Bounded, fixed-delay reconnect parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectPolicy {
    /// Maximum automatic attempts after the connection is lost (0 disables).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before each attempt, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}
fn default_delay_ms() -> u64 {
    DEFAULT_RECONNECT_DELAY_MS
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_ms: DEFAULT_RECONNECT_DELAY_MS,
        }
    }
}

impl ReconnectPolicy {
    /// Build a policy from explicit values.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Delay before each attempt.
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Whether another attempt is allowed after `attempts` have been made.
    #[must_use]
    pub fn allows(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
