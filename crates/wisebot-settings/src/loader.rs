//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`WisebotSettings::default()`]
//! 2. If `~/.wisebot/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `WISEBOT_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::WisebotSettings;

/// Per-user data directory (`~/.wisebot`).
pub fn wisebot_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".wisebot")
}

/// Resolve the path to the settings file (`~/.wisebot/settings.json`).
pub fn settings_path() -> PathBuf {
    wisebot_dir().join("settings.json")
}

/// Resolve the identity file: `identity.file` if set, else `~/.wisebot/identity`.
pub fn identity_path(settings: &WisebotSettings) -> PathBuf {
    settings
        .identity
        .file
        .as_ref()
        .map_or_else(|| wisebot_dir().join("identity"), PathBuf::from)
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<WisebotSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<WisebotSettings> {
    let defaults = serde_json::to_value(WisebotSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: WisebotSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `WISEBOT_*` environment variable overrides.
///
/// Invalid or out-of-range values are ignored with a warning and the file or
/// default value stays in effect.
pub fn apply_env_overrides(settings: &mut WisebotSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary lookup (env in production, a map in tests).
pub fn apply_overrides_from(
    settings: &mut WisebotSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let read = |name: &str| lookup(name).filter(|v| !v.is_empty());

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = read("WISEBOT_WS_URL") {
        settings.server.ws_url = v;
    }
    if let Some(v) = read("WISEBOT_HTTP_URL") {
        settings.server.http_url = v;
    }

    // ── Connection ──────────────────────────────────────────────────
    if let Some(v) = read("WISEBOT_MAX_RECONNECT_ATTEMPTS")
        .and_then(|v| checked("WISEBOT_MAX_RECONNECT_ATTEMPTS", &v, parse_u32_range(&v, 0, 100)))
    {
        settings.connection.max_reconnect_attempts = v;
    }
    if let Some(v) = read("WISEBOT_RECONNECT_DELAY_MS")
        .and_then(|v| checked("WISEBOT_RECONNECT_DELAY_MS", &v, parse_u64_range(&v, 10, 600_000)))
    {
        settings.connection.reconnect_delay_ms = v;
    }
    if let Some(v) = read("WISEBOT_CONNECT_TIMEOUT_MS")
        .and_then(|v| checked("WISEBOT_CONNECT_TIMEOUT_MS", &v, parse_u64_range(&v, 100, 600_000)))
    {
        settings.connection.connect_timeout_ms = v;
    }

    // ── Identity / logging ──────────────────────────────────────────
    if let Some(v) = read("WISEBOT_IDENTITY_FILE") {
        settings.identity.file = Some(v);
    }
    if let Some(v) = read("WISEBOT_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

fn checked<T>(key: &str, raw: &str, parsed: Option<T>) -> Option<T> {
    if parsed.is_none() {
        tracing::warn!(key, value = %raw, "invalid numeric env var, ignoring");
    }
    parsed
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u32` within an inclusive range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
