//! Credential persistence via OS keyring
//!
//! Values are stored in the operating system's native credential store
//! (Keychain on macOS, Secret Service on Linux, Windows Credential Manager
//! on Windows). Each key becomes one keyring entry under a shared service
//! name so that Reelkit entries never collide with other applications.

use crate::error::{ReelkitError, Result};
use crate::storage::CredentialStore;

/// Accessor for the OS native keyring
///
/// # Examples
///
/// ```no_run
/// use reelkit::storage::{CredentialStore, KeyringStore, AUTH_TOKEN_KEY};
///
/// let store = KeyringStore::new("reelkit");
/// store.set(AUTH_TOKEN_KEY, "my_token").unwrap();
/// assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("my_token"));
/// ```
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    /// Creates a store whose entries live under `service`
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Keyring service name used for all entries
    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, key).map_err(|e| ReelkitError::Keyring(e).into())
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(ReelkitError::Keyring(e).into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(ReelkitError::Keyring)?;
        tracing::debug!(service = %self.service, key, "Stored credential in keyring");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ReelkitError::Keyring(e).into()),
        }
    }
}
