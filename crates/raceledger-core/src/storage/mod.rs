//! Persistence Backends
//!
//! A ledger is saved and loaded through the [`PersistenceBackend`] trait.
//! Two implementations ship:
//!
//! - [`DocumentBackend`]: one JSON document (`results.json`), rewritten
//!   atomically on every save
//! - [`SqliteBackend`]: a `results` table in an embedded SQLite database
//!   (`results.db`), replaced wholesale inside one transaction on every save
//!
//! Backends hand records back undecoded so the ledger can skip a bad record
//! without discarding the rest.

mod document;
mod error;
mod sqlite;

pub use document::DocumentBackend;
pub use error::{CorruptStoreError, LoadError, PersistenceError};
pub use sqlite::SqliteBackend;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::record::{PendingEntry, RaceResult};

/// Ledger content as read back from a backend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredLedger {
    /// Scratch fields of an entry that was being filled in
    pub pending: PendingEntry,
    /// Raw records, newest first
    pub records: Vec<Value>,
}

/// Uniform save/load contract for ledger storage
pub trait PersistenceBackend: Send {
    /// Read everything that was stored.
    ///
    /// Returns `Ok(None)` when nothing has been stored yet.
    fn load(&mut self) -> Result<Option<StoredLedger>, LoadError>;

    /// Replace the stored ledger with `records` (newest first)
    fn save(&mut self, records: &[RaceResult], pending: &PendingEntry)
        -> Result<(), PersistenceError>;

    /// Human readable location, used in logs
    fn describe(&self) -> String;
}

/// Which backend a ledger is stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// JSON document, see [`DocumentBackend`]
    Document,
    /// SQLite database, see [`SqliteBackend`]
    #[default]
    Sqlite,
}

impl BackendKind {
    /// File name the backend uses inside the data directory
    pub fn file_name(&self) -> &'static str {
        match self {
            BackendKind::Document => DocumentBackend::FILE_NAME,
            BackendKind::Sqlite => SqliteBackend::FILE_NAME,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Document => f.write_str("document"),
            BackendKind::Sqlite => f.write_str("sqlite"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "document" | "json" => Ok(BackendKind::Document),
            "sqlite" | "db" => Ok(BackendKind::Sqlite),
            other => Err(format!("Unknown backend: {}", other)),
        }
    }
}

/// Open the backend of the given kind inside `data_dir`, creating the
/// directory if needed.
pub fn open_backend(
    kind: BackendKind,
    data_dir: &Path,
) -> Result<Box<dyn PersistenceBackend>, PersistenceError> {
    fs::create_dir_all(data_dir)?;
    let path = data_dir.join(kind.file_name());

    let backend: Box<dyn PersistenceBackend> = match kind {
        BackendKind::Document => Box::new(DocumentBackend::new(path)),
        BackendKind::Sqlite => Box::new(SqliteBackend::open(path)?),
    };
    Ok(backend)
}
