//! Credential vault errors

use thiserror::Error;

/// Errors from the vault or its secret store
#[derive(Error, Debug)]
pub enum VaultError {
    /// The backing secret store failed
    #[error("Secret store error: {0}")]
    Store(String),

    /// A thread panicked while holding the session cache
    #[error("Credential cache lock poisoned")]
    LockPoisoned,
}
