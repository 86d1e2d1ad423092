//! Persistence errors

use thiserror::Error;

/// A backend failed to read or write its medium.
///
/// Surfaced to callers of the ledger; the in-memory ledger keeps the change.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// File system failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The document could not be written
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The stored ledger was never read, so it is not overwritten
    #[error("Stored ledger could not be read ({0}); refusing to overwrite it")]
    Unread(String),
}

/// Stored content exists but cannot be understood as a ledger
#[derive(Error, Debug)]
#[error("Corrupt store at {location}: {reason}")]
pub struct CorruptStoreError {
    /// File path or other backend location
    pub location: String,
    /// What was wrong with it
    pub reason: String,
}

/// Reasons a backend could not hand back a stored ledger
#[derive(Error, Debug)]
pub enum LoadError {
    /// Content is there but is not a ledger
    #[error(transparent)]
    Corrupt(#[from] CorruptStoreError),

    /// The medium could not be read
    #[error(transparent)]
    Io(#[from] PersistenceError),
}
