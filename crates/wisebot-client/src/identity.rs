//! Session identity provider.
//!
//! One identity per installation, generated on first use by
//! [`SessionIdentity::generate`], persisted through an [`IdentityStore`]
//! and cached in memory for the life of the provider.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use wisebot_core::ids::SessionIdentity;

use crate::errors::IdentityError;

/// Persistence for the installation identity.
pub trait IdentityStore: Send + Sync {
    /// Stored raw value, if any.
    fn load(&self) -> Result<Option<String>, IdentityError>;
    /// Persist `identity`, replacing any previous value.
    fn save(&self, identity: &SessionIdentity) -> Result<(), IdentityError>;
}

/// Identity kept in a single-line file (mode 0600 on Unix).
#[derive(Clone, Debug)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    /// Store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IdentityStore for FileIdentityStore {
    fn load(&self) -> Result<Option<String>, IdentityError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content.trim().to_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, identity: &SessionIdentity) -> Result<(), IdentityError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, format!("{identity}\n"))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&self.path, perms);
        }
        Ok(())
    }
}

/// In-process store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    value: Mutex<Option<String>>,
}

impl MemoryIdentityStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a raw value.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
        }
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> Result<Option<String>, IdentityError> {
        Ok(self.value.lock().clone())
    }

    fn save(&self, identity: &SessionIdentity) -> Result<(), IdentityError> {
        *self.value.lock() = Some(identity.as_str().to_owned());
        Ok(())
    }
}

/// Yields the installation identity, touching the store at most once per
/// read and once per write over the provider's lifetime.
pub struct IdentityProvider<S: IdentityStore = FileIdentityStore> {
    store: S,
    cached: Mutex<Option<SessionIdentity>>,
}

impl<S: IdentityStore> IdentityProvider<S> {
    /// Provider over `store`.
    pub fn new(store: S) -> Self {
        Self {
            store,
            cached: Mutex::new(None),
        }
    }

    /// Return the stored identity, generating and persisting one if absent.
    ///
    /// A stored value that is not a valid identity is replaced.
    pub fn get_or_create_identity(&self) -> Result<SessionIdentity, IdentityError> {
        let mut cached = self.cached.lock();
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }

        let identity = match self.store.load()? {
            Some(raw) => match SessionIdentity::parse(&raw) {
                Some(id) => {
                    debug!(identity = %id, "loaded stored identity");
                    id
                }
                None => {
                    warn!(stored = %raw, "stored identity is invalid, regenerating");
                    self.create()?
                }
            },
            None => self.create()?,
        };

        *cached = Some(identity.clone());
        Ok(identity)
    }

    /// Persist an explicit identity and make it current.
    pub fn set_identity(&self, raw: &str) -> Result<SessionIdentity, IdentityError> {
        let identity =
            SessionIdentity::parse(raw).ok_or_else(|| IdentityError::Invalid(raw.to_owned()))?;
        self.store.save(&identity)?;
        *self.cached.lock() = Some(identity.clone());
        Ok(identity)
    }

    fn create(&self) -> Result<SessionIdentity, IdentityError> {
        let identity = SessionIdentity::generate();
        self.store.save(&identity)?;
        info!(identity = %identity, "generated new identity");
        Ok(identity)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
