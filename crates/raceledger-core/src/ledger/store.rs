//! Ledger store: the in-memory ledger plus the backend it is written through to

use super::{Ledger, LedgerError, LEDGER_CAPACITY};
use crate::record::{decode, PendingEntry, RaceResult};
use crate::storage::{LoadError, PersistenceBackend, PersistenceError};

/// How the store came up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing had been stored yet
    Fresh,
    /// Stored data was read; `skipped` records could not be decoded
    Loaded {
        /// Records kept in the ledger
        records: usize,
        /// Records that could not be decoded
        skipped: usize,
    },
    /// Stored data was unusable and the ledger starts empty
    Recovered {
        /// Why the stored data was discarded
        reason: String,
    },
    /// Stored data could not be read right now (locked, permissions).
    ///
    /// The ledger starts empty and saving is refused until
    /// [`LedgerStore::reload`] succeeds or the ledger is cleared, so the
    /// unread data is never overwritten.
    Unreadable {
        /// The read error
        reason: String,
    },
}

/// Owns the ledger, the pending entry and the persistence backend.
///
/// Every mutation is saved synchronously. A failed save is returned to the
/// caller but the in-memory change stays: for the running process the
/// in-memory ledger is the source of truth.
pub struct LedgerStore {
    ledger: Ledger,
    pending: PendingEntry,
    backend: Box<dyn PersistenceBackend>,
    outcome: LoadOutcome,
    /// Set while the stored data is unread; saves are refused
    unread: Option<String>,
}

impl LedgerStore {
    /// Load the ledger from `backend`.
    ///
    /// Never fails: missing, corrupt or unreadable storage yields an empty
    /// ledger (see [`LedgerStore::load_outcome`]). Unreadable storage also
    /// makes the store refuse saves until [`LedgerStore::reload`] succeeds.
    pub fn load(backend: Box<dyn PersistenceBackend>) -> Self {
        Self::load_with_capacity(backend, LEDGER_CAPACITY)
    }

    /// Like [`LedgerStore::load`] with a custom capacity
    pub fn load_with_capacity(mut backend: Box<dyn PersistenceBackend>, capacity: usize) -> Self {
        let (ledger, pending, outcome) = read_backend(backend.as_mut(), capacity);
        Self {
            ledger,
            pending,
            backend,
            unread: unread_reason(&outcome),
            outcome,
        }
    }

    /// Read the backend again, replacing the in-memory state.
    ///
    /// This is how a store that came up [`LoadOutcome::Unreadable`] gets
    /// back to a writable state once the medium can be read.
    pub fn reload(&mut self) -> &LoadOutcome {
        let (ledger, pending, outcome) = read_backend(self.backend.as_mut(), self.ledger.capacity());
        self.ledger = ledger;
        self.pending = pending;
        self.unread = unread_reason(&outcome);
        self.outcome = outcome;
        &self.outcome
    }

    /// Insert `record` as the newest result and persist the ledger
    pub fn add(&mut self, record: RaceResult) -> Result<(), PersistenceError> {
        if let Some(evicted) = self.ledger.push(record.normalized()) {
            tracing::debug!(
                "Evicted oldest result ({} at {})",
                evicted.car_model,
                evicted.track_name
            );
        }
        self.save()
    }

    /// Results, newest first
    pub fn all(&self) -> &[RaceResult] {
        self.ledger.as_slice()
    }

    /// Owned copy of the results, newest first
    pub fn snapshot(&self) -> Vec<RaceResult> {
        self.ledger.as_slice().to_vec()
    }

    /// Remove every result and persist the empty ledger.
    ///
    /// The pending entry is left alone. Clearing is an explicit request to
    /// discard stored data, so it also writes over a store that could not
    /// be read.
    pub fn clear(&mut self) -> Result<(), PersistenceError> {
        self.ledger.clear();
        if let Some(reason) = self.unread.take() {
            tracing::warn!(
                "Clearing {} without having read it ({})",
                self.backend.describe(),
                reason
            );
        }
        self.save()
    }

    /// Number of stored results
    pub fn len(&self) -> usize {
        self.ledger.len()
    }

    /// True when no results are stored
    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty()
    }

    /// Maximum number of results kept
    pub fn capacity(&self) -> usize {
        self.ledger.capacity()
    }

    /// The entry currently being filled in
    pub fn pending(&self) -> &PendingEntry {
        &self.pending
    }

    /// Change the pending entry and persist it
    pub fn update_pending(
        &mut self,
        update: impl FnOnce(&mut PendingEntry),
    ) -> Result<(), PersistenceError> {
        update(&mut self.pending);
        self.save()
    }

    /// Turn the pending entry into a result and add it.
    ///
    /// On a validation error nothing changes. On success the pending entry
    /// is reset and the added result is returned.
    pub fn commit_pending(&mut self) -> Result<RaceResult, LedgerError> {
        let record = self.pending.to_record()?;
        self.pending = PendingEntry::default();
        self.add(record.clone())?;
        Ok(record)
    }

    /// Write the current state through to the backend.
    ///
    /// Refused with [`PersistenceError::Unread`] while the stored data has
    /// not been read.
    pub fn save(&mut self) -> Result<(), PersistenceError> {
        if let Some(reason) = &self.unread {
            tracing::error!(
                "Not saving to {}: stored ledger was never read ({})",
                self.backend.describe(),
                reason
            );
            return Err(PersistenceError::Unread(reason.clone()));
        }
        self.backend
            .save(self.ledger.as_slice(), &self.pending)
            .inspect_err(|e| {
                tracing::error!("Failed to save ledger to {}: {}", self.backend.describe(), e)
            })
    }

    /// What happened when the store was loaded
    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.outcome
    }

    /// Backend location, for display
    pub fn describe_backend(&self) -> String {
        self.backend.describe()
    }
}

fn read_backend(
    backend: &mut dyn PersistenceBackend,
    capacity: usize,
) -> (Ledger, PendingEntry, LoadOutcome) {
    let location = backend.describe();

    match backend.load() {
        Ok(None) => {
            tracing::debug!("No stored ledger at {}, starting empty", location);
            (Ledger::with_capacity(capacity), PendingEntry::default(), LoadOutcome::Fresh)
        }
        Ok(Some(stored)) => {
            let total = stored.records.len();
            let mut skipped = 0;
            let records = stored.records.iter().enumerate().filter_map(|(idx, raw)| {
                match decode(raw) {
                    Ok(rec) => Some(rec.normalized()),
                    Err(e) => {
                        tracing::warn!("Skipping stored result #{} in {}: {}", idx, location, e);
                        skipped += 1;
                        None
                    }
                }
            });
            let ledger = Ledger::from_records(records.collect::<Vec<_>>(), capacity);

            if total - skipped > ledger.len() {
                tracing::warn!(
                    "{} holds {} results, keeping the newest {}",
                    location,
                    total - skipped,
                    ledger.len()
                );
            }
            tracing::debug!("Loaded {} results from {}", ledger.len(), location);

            let outcome = LoadOutcome::Loaded {
                records: ledger.len(),
                skipped,
            };
            (ledger, stored.pending, outcome)
        }
        Err(LoadError::Corrupt(e)) => {
            tracing::warn!("{}; starting with an empty ledger", e);
            let outcome = LoadOutcome::Recovered {
                reason: e.to_string(),
            };
            (Ledger::with_capacity(capacity), PendingEntry::default(), outcome)
        }
        Err(LoadError::Io(e)) => {
            tracing::error!(
                "Could not read ledger from {}: {}; saving is disabled until it can be read",
                location,
                e
            );
            let outcome = LoadOutcome::Unreadable {
                reason: e.to_string(),
            };
            (Ledger::with_capacity(capacity), PendingEntry::default(), outcome)
        }
    }
}

fn unread_reason(outcome: &LoadOutcome) -> Option<String> {
    match outcome {
        LoadOutcome::Unreadable { reason } => Some(reason.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{encode, SchemaError};
    use crate::storage::{CorruptStoreError, StoredLedger};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Backend that keeps what it was given and can be told to fail
    #[derive(Clone, Default)]
    struct MemoryBackend {
        stored: Arc<Mutex<Option<StoredLedger>>>,
        fail_saves: Arc<Mutex<bool>>,
        fail_loads: Arc<Mutex<bool>>,
        corrupt: bool,
    }

    impl PersistenceBackend for MemoryBackend {
        fn load(&mut self) -> Result<Option<StoredLedger>, LoadError> {
            if self.corrupt {
                return Err(LoadError::Corrupt(CorruptStoreError {
                    location: "memory".to_string(),
                    reason: "truncated".to_string(),
                }));
            }
            if *self.fail_loads.lock().unwrap() {
                return Err(LoadError::Io(PersistenceError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "locked",
                ))));
            }
            Ok(self.stored.lock().unwrap().clone())
        }

        fn save(
            &mut self,
            records: &[RaceResult],
            pending: &PendingEntry,
        ) -> Result<(), PersistenceError> {
            if *self.fail_saves.lock().unwrap() {
                return Err(PersistenceError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )));
            }
            *self.stored.lock().unwrap() = Some(StoredLedger {
                pending: pending.clone(),
                records: records.iter().map(encode).collect(),
            });
            Ok(())
        }

        fn describe(&self) -> String {
            "memory".to_string()
        }
    }

    fn result(n: u32) -> RaceResult {
        RaceResult::manual(format!("Car {}", n), n % 5, Some(n), format!("Track {}", n)).unwrap()
    }

    #[test]
    fn test_fresh_backend_loads_empty() {
        let store = LedgerStore::load(Box::new(MemoryBackend::default()));
        assert!(store.is_empty());
        assert_eq!(store.load_outcome(), &LoadOutcome::Fresh);
    }

    #[test]
    fn test_corrupt_backend_loads_empty() {
        let backend = MemoryBackend {
            corrupt: true,
            ..Default::default()
        };
        let store = LedgerStore::load(Box::new(backend));
        assert!(store.is_empty());
        assert!(matches!(store.load_outcome(), LoadOutcome::Recovered { .. }));
    }

    #[test]
    fn test_add_writes_through() {
        let backend = MemoryBackend::default();
        let mut store = LedgerStore::load(Box::new(backend.clone()));
        store.add(result(1)).unwrap();

        let stored = backend.stored.lock().unwrap().clone().unwrap();
        assert_eq!(stored.records.len(), 1);
        assert_eq!(decode(&stored.records[0]).unwrap(), result(1));
    }

    #[test]
    fn test_failed_save_keeps_memory_state() {
        let backend = MemoryBackend::default();
        *backend.fail_saves.lock().unwrap() = true;

        let mut store = LedgerStore::load(Box::new(backend.clone()));
        let err = store.add(result(1)).unwrap_err();
        assert!(matches!(err, PersistenceError::Io(_)));
        assert_eq!(store.all(), &[result(1)]);
        assert!(backend.stored.lock().unwrap().is_none());
    }

    #[test]
    fn test_bad_records_are_skipped() {
        let backend = MemoryBackend::default();
        *backend.stored.lock().unwrap() = Some(StoredLedger {
            pending: PendingEntry::default(),
            records: vec![
                encode(&result(3)),
                json!("not a record"),
                json!({ "incidents_count": "many" }),
                encode(&result(1)),
            ],
        });

        let store = LedgerStore::load(Box::new(backend));
        assert_eq!(store.all(), &[result(3), result(1)]);
        assert_eq!(
            store.load_outcome(),
            &LoadOutcome::Loaded {
                records: 2,
                skipped: 2
            }
        );
    }

    #[test]
    fn test_oversized_store_is_truncated() {
        let backend = MemoryBackend::default();
        *backend.stored.lock().unwrap() = Some(StoredLedger {
            pending: PendingEntry::default(),
            records: (1..=20).rev().map(|n| encode(&result(n))).collect(),
        });

        let store = LedgerStore::load(Box::new(backend));
        assert_eq!(store.len(), LEDGER_CAPACITY);
        assert_eq!(store.all()[0], result(20));
    }

    #[test]
    fn test_commit_pending() {
        let backend = MemoryBackend::default();
        let mut store = LedgerStore::load(Box::new(backend.clone()));

        store
            .update_pending(|p| p.car_model = Some("Toyota GR86".to_string()))
            .unwrap();
        assert!(matches!(
            store.commit_pending(),
            Err(LedgerError::Schema(SchemaError::MissingField("track_name")))
        ));
        assert!(store.is_empty());
        assert_eq!(store.pending().car_model.as_deref(), Some("Toyota GR86"));

        store
            .update_pending(|p| {
                p.track_name = Some("Okayama".to_string());
                p.incidents_count = Some(2);
            })
            .unwrap();
        let added = store.commit_pending().unwrap();
        assert_eq!(added.track_name, "Okayama");
        assert_eq!(store.all(), &[added]);
        assert!(store.pending().is_empty());

        let stored = backend.stored.lock().unwrap().clone().unwrap();
        assert!(stored.pending.is_empty());
    }

    #[test]
    fn test_clear_persists_empty_state() {
        let backend = MemoryBackend::default();
        let mut store = LedgerStore::load(Box::new(backend.clone()));
        store.add(result(1)).unwrap();
        store.add(result(2)).unwrap();
        store.clear().unwrap();

        assert!(store.is_empty());
        let stored = backend.stored.lock().unwrap().clone().unwrap();
        assert!(stored.records.is_empty());
    }

    #[test]
    fn test_unreadable_store_is_never_overwritten() {
        let backend = MemoryBackend::default();
        let mut first = LedgerStore::load(Box::new(backend.clone()));
        first.add(result(1)).unwrap();
        first.add(result(2)).unwrap();

        *backend.fail_loads.lock().unwrap() = true;
        let mut store = LedgerStore::load(Box::new(backend.clone()));
        assert!(store.is_empty());
        assert!(matches!(store.load_outcome(), LoadOutcome::Unreadable { .. }));

        *backend.fail_loads.lock().unwrap() = false;
        assert!(matches!(store.add(result(3)), Err(PersistenceError::Unread(_))));
        assert!(matches!(
            store.update_pending(|p| p.car_model = Some("Mini".to_string())),
            Err(PersistenceError::Unread(_))
        ));
        let stored = backend.stored.lock().unwrap().clone().unwrap();
        assert_eq!(stored.records.len(), 2);

        assert_eq!(
            store.reload(),
            &LoadOutcome::Loaded {
                records: 2,
                skipped: 0
            }
        );
        store.add(result(3)).unwrap();
        assert_eq!(store.all(), &[result(3), result(2), result(1)]);
    }

    #[test]
    fn test_clear_writes_over_unreadable_store() {
        let backend = MemoryBackend::default();
        LedgerStore::load(Box::new(backend.clone())).add(result(1)).unwrap();

        *backend.fail_loads.lock().unwrap() = true;
        let mut store = LedgerStore::load(Box::new(backend.clone()));
        store.clear().unwrap();
        store.add(result(2)).unwrap();

        let stored = backend.stored.lock().unwrap().clone().unwrap();
        assert_eq!(stored.records.len(), 1);
    }
}
