//! Durable key-value storage for the auth token
//!
//! The session store only ever persists one value (the bearer token), but
//! the collaborator contract is a plain string key-value store so that the
//! OS keyring and the in-memory store used by tests are interchangeable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::{StorageConfig, StorageKind};
use crate::error::{ReelkitError, Result};

pub mod os_keyring;

pub use os_keyring::KeyringStore;

/// Key under which the bearer token is stored.
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Durable string key-value storage
///
/// Implementations must make `set` durable before returning `Ok`; the
/// session store relies on that to keep memory and storage in step.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored value, or `None` when the key was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`; removing a missing key is not an error
    fn delete(&self, key: &str) -> Result<()>;
}

/// Builds the credential store selected by configuration
///
/// # Examples
///
/// ```
/// use reelkit::config::{StorageConfig, StorageKind};
/// use reelkit::storage::{create_store, AUTH_TOKEN_KEY};
///
/// let config = StorageConfig {
///     kind: StorageKind::Memory,
///     service: "reelkit".to_string(),
/// };
/// let store = create_store(&config);
/// assert!(store.get(AUTH_TOKEN_KEY).unwrap().is_none());
/// ```
pub fn create_store(config: &StorageConfig) -> Arc<dyn CredentialStore> {
    match config.kind {
        StorageKind::Keyring => Arc::new(KeyringStore::new(config.service.clone())),
        StorageKind::Memory => Arc::new(MemoryStore::default()),
    }
}

/// Process-local credential store
///
/// Nothing survives process exit. Used by tests and by `storage.kind: memory`.
/// Writes can be made to fail on demand to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `key = value`
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .lock_entries()
            .insert(key.to_string(), value.to_string());
        store
    }

    /// Makes every subsequent `set` and `delete` fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `get` fail
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ReelkitError::Storage(format!("read of '{}' failed", key)).into());
        }
        Ok(self.lock_entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ReelkitError::Storage(format!("write of '{}' failed", key)).into());
        }
        self.lock_entries()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ReelkitError::Storage(format!("delete of '{}' failed", key)).into());
        }
        self.lock_entries().remove(key);
        Ok(())
    }
}
