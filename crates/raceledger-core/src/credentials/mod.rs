//! Credential Vault
//!
//! Keeps the username/password for the remote stats service.
//!
//! Credentials live in a session cache for the lifetime of the process.
//! They only reach the OS secret store through [`CredentialVault::set`],
//! which callers use when the user explicitly logs in, and
//! [`CredentialVault::clear`] removes them from both places. Secrets never
//! go near the results store.

mod error;
mod store;

pub use error::VaultError;
pub use store::{KeyringStore, MemoryStore, SecretStore};

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::RwLock;

/// Secret store service name
pub const SERVICE: &str = "SimracingDataApp";
/// Secret store key holding the username
pub const USERNAME_KEY: &str = "iRacingUsername";
/// Secret store key holding the password
pub const PASSWORD_KEY: &str = "iRacingPassword";

/// Username and password for the remote service
pub struct Credentials {
    /// Account e-mail
    pub username: String,
    password: SecretString,
}

impl Credentials {
    /// Wrap a username and clear-text password
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// The password in clear text; keep the borrow short
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl Clone for Credentials {
    fn clone(&self) -> Self {
        Self::new(self.username.clone(), self.password())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for Credentials {
    fn eq(&self, other: &Self) -> bool {
        self.username == other.username && self.password() == other.password()
    }
}

/// Session cache in front of a [`SecretStore`]
pub struct CredentialVault {
    store: Box<dyn SecretStore>,
    service: String,
    session: RwLock<Option<Credentials>>,
}

impl CredentialVault {
    /// Vault using the default service name
    pub fn new(store: Box<dyn SecretStore>) -> Self {
        Self::with_service(store, SERVICE)
    }

    /// Vault storing its secrets under `service`
    pub fn with_service(store: Box<dyn SecretStore>, service: impl Into<String>) -> Self {
        Self {
            store,
            service: service.into(),
            session: RwLock::new(None),
        }
    }

    /// Current credentials, or `None` when nothing is cached or stored.
    ///
    /// A store holding only one of the two keys counts as empty.
    pub fn get(&self) -> Result<Option<Credentials>, VaultError> {
        {
            let session = self.session.read().map_err(|_| VaultError::LockPoisoned)?;
            if let Some(creds) = session.as_ref() {
                return Ok(Some(creds.clone()));
            }
        }

        let username = self.store.get_secret(&self.service, USERNAME_KEY)?;
        let password = self.store.get_secret(&self.service, PASSWORD_KEY)?;

        let creds = match (username, password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Credentials::new(u, p),
            _ => return Ok(None),
        };

        let mut session = self.session.write().map_err(|_| VaultError::LockPoisoned)?;
        *session = Some(creds.clone());
        Ok(Some(creds))
    }

    /// Persist credentials to the secret store and cache them
    pub fn set(&self, credentials: Credentials) -> Result<(), VaultError> {
        self.store
            .set_secret(&self.service, USERNAME_KEY, &credentials.username)?;
        self.store
            .set_secret(&self.service, PASSWORD_KEY, credentials.password())?;
        tracing::info!("Stored credentials for {}", credentials.username);

        self.set_session(credentials)
    }

    /// Cache credentials for this process only
    pub fn set_session(&self, credentials: Credentials) -> Result<(), VaultError> {
        let mut session = self.session.write().map_err(|_| VaultError::LockPoisoned)?;
        *session = Some(credentials);
        Ok(())
    }

    /// Remove credentials from the cache and the secret store.
    ///
    /// Clearing an empty vault succeeds.
    pub fn clear(&self) -> Result<(), VaultError> {
        {
            let mut session = self.session.write().map_err(|_| VaultError::LockPoisoned)?;
            *session = None;
        }

        let removed_user = self.store.delete_secret(&self.service, USERNAME_KEY)?;
        let removed_pass = self.store.delete_secret(&self.service, PASSWORD_KEY)?;
        if removed_user || removed_pass {
            tracing::info!("Cleared stored credentials");
        } else {
            tracing::debug!("No stored credentials to clear");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault() -> (CredentialVault, MemoryStore) {
        let store = MemoryStore::default();
        (CredentialVault::new(Box::new(store.clone())), store)
    }

    #[test]
    fn test_get_on_empty_vault() {
        let (vault, _) = vault();
        assert!(vault.get().unwrap().is_none());
    }

    #[test]
    fn test_set_then_get() {
        let (vault, store) = vault();
        vault.set(Credentials::new("driver@example.com", "hunter2")).unwrap();

        let creds = vault.get().unwrap().unwrap();
        assert_eq!(creds.username, "driver@example.com");
        assert_eq!(creds.password(), "hunter2");
        assert_eq!(
            store.get_secret(SERVICE, PASSWORD_KEY).unwrap().as_deref(),
            Some("hunter2")
        );
    }

    #[test]
    fn test_session_credentials_are_not_persisted() {
        let (vault, store) = vault();
        vault
            .set_session(Credentials::new("driver@example.com", "hunter2"))
            .unwrap();

        assert!(vault.get().unwrap().is_some());
        assert!(store.get_secret(SERVICE, USERNAME_KEY).unwrap().is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (vault, _) = vault();
        vault.clear().unwrap();
        vault.clear().unwrap();
        assert!(vault.get().unwrap().is_none());

        vault.set(Credentials::new("a", "b")).unwrap();
        vault.clear().unwrap();
        vault.clear().unwrap();
        assert!(vault.get().unwrap().is_none());
    }

    #[test]
    fn test_partial_store_reads_as_absent() {
        let (vault, store) = vault();
        store.set_secret(SERVICE, USERNAME_KEY, "only-user").unwrap();
        assert!(vault.get().unwrap().is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("driver", "s3cret");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("driver"));
        assert!(!debug.contains("s3cret"));
    }
}
