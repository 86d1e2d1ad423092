//! # RaceLedger Core Library
//!
//! Core functionality for RaceLedger, a personal sim-racing results log.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - The race result record and its lenient JSON schema
//! - A bounded, newest-first ledger of results with pluggable persistence
//!   (JSON document or SQLite)
//! - A remote stats adapter that fetches and normalizes iRacing data
//! - A credential vault backed by the OS keyring
//!
//! ## Example
//!
//! ```rust,ignore
//! use raceledger_core::prelude::*;
//!
//! let backend = open_backend(BackendKind::Sqlite, &data_dir)?;
//! let mut store = LedgerStore::load(backend);
//!
//! store.add(RaceResult::manual("GT3", 2, Some(1), "Spa")?)?;
//! for result in store.all() {
//!     println!("{} @ {}", result.car_model, result.track_name);
//! }
//! ```

/// Remote service credentials and where they are kept
pub mod credentials;
/// The bounded results history and its write-through store
pub mod ledger;
/// Race result records and their storage schema
pub mod record;
/// Remote stats fetching and normalization
pub mod remote;
/// Application settings
pub mod settings;
/// Ledger persistence backends
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::credentials::{CredentialVault, Credentials, KeyringStore, MemoryStore};
    pub use crate::ledger::{Ledger, LedgerStore, LoadOutcome, SharedLedger, LEDGER_CAPACITY};
    pub use crate::record::{PendingEntry, RaceResult, RemoteDetails};
    pub use crate::remote::{
        DisplayZone, IRacingClient, LookupTables, RemoteError, StatsAdapter, StatsApi,
    };
    pub use crate::settings::AppSettings;
    pub use crate::storage::{open_backend, BackendKind, PersistenceBackend};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
