//! Thread-safe handle to a ledger store
//!
//! Mutations hold the lock across "change memory + persist" so two writers
//! can never interleave their saves. Reads copy the records out under the
//! lock and never observe a half-applied mutation.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{LedgerError, LedgerStore};
use crate::record::RaceResult;

/// Cloneable, lock-protected [`LedgerStore`]
#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<LedgerStore>>,
}

impl SharedLedger {
    /// Wrap `store`; clones share it
    pub fn new(store: LedgerStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// See [`LedgerStore::add`]
    pub fn add(&self, record: RaceResult) -> Result<(), LedgerError> {
        Ok(self.lock()?.add(record)?)
    }

    /// See [`LedgerStore::clear`]
    pub fn clear(&self) -> Result<(), LedgerError> {
        Ok(self.lock()?.clear()?)
    }

    /// See [`LedgerStore::commit_pending`]
    pub fn commit_pending(&self) -> Result<RaceResult, LedgerError> {
        self.lock()?.commit_pending()
    }

    /// Copy of the records, newest first
    pub fn snapshot(&self) -> Result<Vec<RaceResult>, LedgerError> {
        Ok(self.lock()?.snapshot())
    }

    /// Run `f` with exclusive access to the store
    pub fn with_store<T>(&self, f: impl FnOnce(&mut LedgerStore) -> T) -> Result<T, LedgerError> {
        Ok(f(&mut *self.lock()?))
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerStore>, LedgerError> {
        self.inner.lock().map_err(|_| LedgerError::LockPoisoned)
    }
}
