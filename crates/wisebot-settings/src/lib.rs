//! # wisebot-settings
//!
//! Layered configuration for the WiseBot client.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`WisebotSettings::default()`]
//! 2. **User file**: `~/.wisebot/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `WISEBOT_*` overrides (highest priority)
//!
//! The global singleton is reloadable: [`reload_settings_from_path`] swaps
//! the cached value so subsequent [`get_settings`] calls return fresh data.
//!
//! ```no_run
//! use wisebot_settings::get_settings;
//!
//! let settings = get_settings();
//! println!("realtime endpoint: {}", settings.server.ws_url);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    deep_merge, identity_path, load_settings, load_settings_from_path, settings_path, wisebot_dir,
};
pub use types::*;

use std::path::Path;
use std::sync::{Arc, RwLock};

/// Global settings singleton.
///
/// `RwLock<Option<Arc<_>>>` rather than `OnceLock` so the value can be
/// swapped by [`init_settings`] and [`reload_settings_from_path`].
static SETTINGS: RwLock<Option<Arc<WisebotSettings>>> = RwLock::new(None);

/// Get the global settings instance.
///
/// The first call loads `~/.wisebot/settings.json` with env overrides,
/// falling back to compiled defaults if loading fails.
pub fn get_settings() -> Arc<WisebotSettings> {
    {
        let guard = SETTINGS.read().expect("settings lock poisoned");
        if let Some(ref s) = *guard {
            return Arc::clone(s);
        }
    }

    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    if let Some(ref s) = *guard {
        return Arc::clone(s);
    }

    let settings = Arc::new(match load_settings() {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            WisebotSettings::default()
        }
    });
    *guard = Some(Arc::clone(&settings));
    settings
}

/// Replace the global settings with a specific value.
pub fn init_settings(settings: WisebotSettings) {
    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    *guard = Some(Arc::new(settings));
}

/// Reload settings from `path` and swap the global cache.
///
/// A file that fails to load leaves compiled defaults (plus env overrides)
/// in effect and is reported as an error.
pub fn reload_settings_from_path(path: &Path) -> Result<Arc<WisebotSettings>> {
    let loaded = load_settings_from_path(path);
    let new = Arc::new(match &loaded {
        Ok(s) => s.clone(),
        Err(e) => {
            tracing::warn!(error = %e, ?path, "failed to reload settings, falling back to defaults");
            let mut defaults = WisebotSettings::default();
            loader::apply_env_overrides(&mut defaults);
            defaults
        }
    });
    {
        let mut guard = SETTINGS.write().expect("settings lock poisoned");
        *guard = Some(Arc::clone(&new));
    }
    tracing::info!(?path, "settings reloaded");
    loaded.map(|_| new)
}

#[cfg(test)]
pub(crate) fn reset_settings() {
    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    *guard = None;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
