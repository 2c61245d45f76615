//! Persistent session store.
//!
//! Remembers the active checkout ID across restarts so a returning shopper
//! gets their cart back. Storage failures are never fatal: `load` degrades to
//! "no stored session" and `save` degrades to a no-op, which makes the cart
//! fall back to creating a fresh checkout.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use magnolia_core::CheckoutId;
use tracing::{debug, warn};

use crate::error::StorageError;

/// Key under which the checkout ID is stored.
pub const CHECKOUT_ID_KEY: &str = "checkout_id";

/// Durable storage for the checkout session ID.
///
/// Implementors provide the fallible `try_*` methods; callers use the
/// infallible `load`/`save`, which log and swallow [`StorageError`]s.
pub trait SessionStore: Send + Sync {
    /// Read the stored checkout ID.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if storage is unreadable or corrupt.
    fn try_load(&self) -> Result<Option<CheckoutId>, StorageError>;

    /// Overwrite the stored checkout ID.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if storage is not writable.
    fn try_save(&self, id: &CheckoutId) -> Result<(), StorageError>;

    /// Read the stored checkout ID, or `None` if absent or unreadable.
    fn load(&self) -> Option<CheckoutId> {
        match self.try_load() {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Session storage read failed, starting without a stored checkout");
                None
            }
        }
    }

    /// Overwrite the stored checkout ID, ignoring storage failures.
    fn save(&self, id: &CheckoutId) {
        if let Err(e) = self.try_save(id) {
            warn!(error = %e, "Session storage write failed, checkout will not survive a restart");
        }
    }
}

// =============================================================================
// File-backed store
// =============================================================================

/// Session store backed by a small JSON key/value document on disk.
///
/// Other keys in the document are preserved when the checkout ID is saved.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

type Document = BTreeMap<String, String>;

impl FileSessionStore {
    /// Create a store at an explicit path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store at the per-user default location.
    ///
    /// Uses `$XDG_DATA_HOME/magnolia/session.json`, falling back to
    /// `~/.local/share/magnolia/session.json`. Returns `None` when neither
    /// variable is set.
    #[must_use]
    pub fn default_location() -> Option<Self> {
        let base = std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
            .or_else(|| {
                std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/share"))
            })?;

        Some(Self::new(base.join("magnolia").join("session.json")))
    }

    /// Path of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Document, StorageError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(Document::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn try_load(&self) -> Result<Option<CheckoutId>, StorageError> {
        let document = self.read_document()?;
        let id = document
            .get(CHECKOUT_ID_KEY)
            .filter(|value| !value.trim().is_empty())
            .map(|value| CheckoutId::new(value.as_str()));

        debug!(path = %self.path.display(), found = id.is_some(), "Loaded session document");
        Ok(id)
    }

    fn try_save(&self, id: &CheckoutId) -> Result<(), StorageError> {
        // A corrupt document is replaced rather than blocking the save.
        let mut document = self.read_document().unwrap_or_default();
        document.insert(CHECKOUT_ID_KEY.to_string(), id.as_str().to_string());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Write to a sibling file then rename, so a crash never leaves a
        // half-written document behind.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&document)?)?;
        std::fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), "Saved session document");
        Ok(())
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-local session store.
///
/// Clones share the same slot, so a clone behaves like the same storage seen
/// from a fresh page load.
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    slot: Arc<Mutex<Option<CheckoutId>>>,
    available: bool,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    /// Create an empty, available store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            available: true,
        }
    }

    /// Create a store whose every access is denied, like a browser in a
    /// strict privacy mode.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            available: false,
        }
    }

    fn denied() -> StorageError {
        StorageError::Unavailable(std::io::Error::new(
            ErrorKind::PermissionDenied,
            "session storage access denied",
        ))
    }

    fn poisoned() -> StorageError {
        StorageError::Unavailable(std::io::Error::other("session storage lock poisoned"))
    }
}

impl SessionStore for MemorySessionStore {
    fn try_load(&self) -> Result<Option<CheckoutId>, StorageError> {
        if !self.available {
            return Err(Self::denied());
        }
        let slot = self.slot.lock().map_err(|_| Self::poisoned())?;
        Ok(slot.clone())
    }

    fn try_save(&self, id: &CheckoutId) -> Result<(), StorageError> {
        if !self.available {
            return Err(Self::denied());
        }
        let mut slot = self.slot.lock().map_err(|_| Self::poisoned())?;
        *slot = Some(id.clone());
        Ok(())
    }
}
