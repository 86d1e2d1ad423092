//! Ledger errors

use thiserror::Error;

use crate::record::SchemaError;
use crate::storage::PersistenceError;

/// Errors from ledger operations that validate, lock or persist
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The entry did not pass validation; nothing changed
    #[error("Invalid entry: {0}")]
    Schema(#[from] SchemaError),

    /// The change was applied in memory but could not be saved
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// A thread panicked while holding a [`SharedLedger`](super::SharedLedger)
    #[error("Ledger lock poisoned")]
    LockPoisoned,
}
