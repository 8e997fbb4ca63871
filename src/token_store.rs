//! Durable single-token store.
//!
//! SYSTEM CONTEXT
//! ==============
//! The token lives in a string key-value slot under the fixed key `token`,
//! the same shape browser `localStorage` gives a web client. The CLI backs
//! the slot with a JSON file so a session survives process restarts; tests
//! and embedders can use the in-memory slot.
//!
//! The store is the single source of truth for "is there a credential".
//! [`TokenStore`] is a cheap `Clone` handle; the HTTP client and the session
//! façade hold clones of the same slot and always read it at call time.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::StorageError;
use crate::types::Token;

/// Fixed slot key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

// =============================================================================
// KEY-VALUE SLOT
// =============================================================================

/// A durable string map. Implementations must be safe to share across tasks.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local slot; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// JSON-file slot. The whole map is rewritten on every change via a
/// temp-file rename, so readers never observe a half-written file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StorageError {
        StorageError::Io { path: self.path.clone(), source }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.io_err(e)),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt { path: self.path.clone(), source })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let body = serde_json::to_string_pretty(entries)
            .map_err(|source| StorageError::Corrupt { path: self.path.clone(), source })?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))
    }

    /// A corrupt file is replaced with whatever `apply` leaves in a fresh map.
    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>) -> bool) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::Poisoned)?;
        let (mut entries, rewrite) = match self.read_all() {
            Ok(entries) => (entries, false),
            Err(e @ StorageError::Corrupt { .. }) => {
                tracing::warn!(error = %e, "discarding corrupt storage file");
                (BTreeMap::new(), true)
            }
            Err(e) => return Err(e),
        };
        if apply(&mut entries) || rewrite {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

// =============================================================================
// TOKEN STORE
// =============================================================================

/// Shared handle to the persisted bearer token.
///
/// A `clear` the slot refuses still hides the token from every clone for
/// the rest of the process; only a successful `set` lifts that.
#[derive(Clone)]
pub struct TokenStore {
    slot: Arc<dyn KeyValueStore>,
    masked: Arc<AtomicBool>,
}

impl TokenStore {
    #[must_use]
    pub fn new(slot: Arc<dyn KeyValueStore>) -> Self {
        Self { slot, masked: Arc::new(AtomicBool::new(false)) }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Token store backed by a JSON file at `path`. The file is created lazily.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStore::new(path)))
    }

    /// Current token, if any. An unreadable slot counts as empty.
    #[must_use]
    pub fn get(&self) -> Option<Token> {
        if self.masked.load(Ordering::Acquire) {
            return None;
        }
        match self.slot.get(TOKEN_KEY) {
            Ok(Some(raw)) if !raw.is_empty() => Some(Token::new(raw)),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "token slot unreadable; treating as empty");
                None
            }
        }
    }

    /// Replace the stored token.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be written.
    pub fn set(&self, token: &Token) -> Result<(), StorageError> {
        self.slot.set(TOKEN_KEY, token.as_str())?;
        self.masked.store(false, Ordering::Release);
        Ok(())
    }

    /// Remove the stored token. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be written. The token reads as
    /// absent afterwards either way.
    pub fn clear(&self) -> Result<(), StorageError> {
        let result = self.slot.remove(TOKEN_KEY);
        self.masked.store(result.is_err(), Ordering::Release);
        result
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.get().is_none()
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_token", &!self.is_empty())
            .finish()
    }
}

#[cfg(test)]
#[path = "token_store_test.rs"]
mod tests;
