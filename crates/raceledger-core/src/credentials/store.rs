//! Secret store implementations

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::VaultError;

/// Key/value secret storage scoped by service name
pub trait SecretStore: Send + Sync {
    /// Read a secret; `Ok(None)` when nothing is stored under the key
    fn get_secret(&self, service: &str, key: &str) -> Result<Option<String>, VaultError>;

    /// Store a secret, replacing any previous value
    fn set_secret(&self, service: &str, key: &str, value: &str) -> Result<(), VaultError>;

    /// Delete a secret. Returns whether anything was deleted.
    fn delete_secret(&self, service: &str, key: &str) -> Result<bool, VaultError>;
}

/// OS keyring (Keychain, Credential Manager, kernel keyutils)
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringStore;

impl KeyringStore {
    fn entry(service: &str, key: &str) -> Result<keyring::Entry, VaultError> {
        keyring::Entry::new(service, key)
            .map_err(|e| VaultError::Store(format!("Failed to access keyring: {}", e)))
    }
}

impl SecretStore for KeyringStore {
    fn get_secret(&self, service: &str, key: &str) -> Result<Option<String>, VaultError> {
        match Self::entry(service, key)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(VaultError::Store(format!(
                "Failed to read '{}' from keyring: {}",
                key, e
            ))),
        }
    }

    fn set_secret(&self, service: &str, key: &str, value: &str) -> Result<(), VaultError> {
        Self::entry(service, key)?
            .set_password(value)
            .map_err(|e| VaultError::Store(format!("Failed to write '{}' to keyring: {}", key, e)))
    }

    fn delete_secret(&self, service: &str, key: &str) -> Result<bool, VaultError> {
        match Self::entry(service, key)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(VaultError::Store(format!(
                "Failed to delete '{}' from keyring: {}",
                key, e
            ))),
        }
    }
}

/// Process-local store; clones share the same map
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    secrets: Arc<RwLock<HashMap<(String, String), String>>>,
}

impl SecretStore for MemoryStore {
    fn get_secret(&self, service: &str, key: &str) -> Result<Option<String>, VaultError> {
        let secrets = self.secrets.read().map_err(|_| VaultError::LockPoisoned)?;
        Ok(secrets
            .get(&(service.to_string(), key.to_string()))
            .cloned())
    }

    fn set_secret(&self, service: &str, key: &str, value: &str) -> Result<(), VaultError> {
        let mut secrets = self.secrets.write().map_err(|_| VaultError::LockPoisoned)?;
        secrets.insert((service.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    fn delete_secret(&self, service: &str, key: &str) -> Result<bool, VaultError> {
        let mut secrets = self.secrets.write().map_err(|_| VaultError::LockPoisoned)?;
        Ok(secrets
            .remove(&(service.to_string(), key.to_string()))
            .is_some())
    }
}
