//! Tests for the lock-protected ledger handle and the credential vault

#[cfg(test)]
mod tests {
    use raceledger_core::credentials::{
        CredentialVault, Credentials, MemoryStore, SecretStore, PASSWORD_KEY, SERVICE,
        USERNAME_KEY,
    };
    use raceledger_core::ledger::{LedgerError, LedgerStore, SharedLedger, LEDGER_CAPACITY};
    use raceledger_core::record::RaceResult;
    use raceledger_core::storage::{open_backend, BackendKind};
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn test_concurrent_writers_leave_consistent_store() {
        for kind in [BackendKind::Document, BackendKind::Sqlite] {
            let dir = TempDir::new().unwrap();
            let shared = SharedLedger::new(LedgerStore::load(open_backend(kind, dir.path()).unwrap()));

            let handles: Vec<_> = (0..4)
                .map(|writer| {
                    let shared = shared.clone();
                    thread::spawn(move || {
                        for n in 0..10 {
                            let result = RaceResult::manual(
                                format!("Writer {}", writer),
                                n,
                                None,
                                "Nürburgring",
                            )
                            .unwrap();
                            shared.add(result).unwrap();
                            assert!(shared.snapshot().unwrap().len() <= LEDGER_CAPACITY);
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            let in_memory = shared.snapshot().unwrap();
            assert_eq!(in_memory.len(), LEDGER_CAPACITY);

            // What hit the disk last is exactly what is in memory
            let reloaded = LedgerStore::load(open_backend(kind, dir.path()).unwrap());
            assert_eq!(reloaded.snapshot(), in_memory, "backend {}", kind);
        }
    }

    #[test]
    fn test_shared_commit_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::load(open_backend(BackendKind::Document, dir.path()).unwrap());
        let shared = SharedLedger::new(store);

        assert!(shared.commit_pending().is_err());

        shared
            .with_store(|store| {
                store.update_pending(|p| {
                    p.car_model = Some("Dallara IR18".to_string());
                    p.track_name = Some("Indianapolis".to_string());
                })
            })
            .unwrap()
            .unwrap();
        let added = shared.commit_pending().unwrap();
        assert_eq!(shared.snapshot().unwrap(), vec![added]);

        shared.clear().unwrap();
        assert!(shared.snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_poisoned_lock_is_a_ledger_error() {
        let dir = TempDir::new().unwrap();
        let shared =
            SharedLedger::new(LedgerStore::load(open_backend(BackendKind::Document, dir.path()).unwrap()));

        let poisoner = shared.clone();
        let panicked = thread::spawn(move || {
            poisoner
                .with_store(|store| {
                    if store.is_empty() {
                        panic!("writer died mid-update");
                    }
                    store.len()
                })
                .ok();
        })
        .join();
        assert!(panicked.is_err());

        assert!(matches!(shared.snapshot(), Err(LedgerError::LockPoisoned)));
        assert!(matches!(
            shared.with_store(|store| store.len()),
            Err(LedgerError::LockPoisoned)
        ));
        let result = RaceResult::manual("Mini Cooper", 0, None, "Brands Hatch").unwrap();
        assert!(matches!(shared.add(result), Err(LedgerError::LockPoisoned)));
    }

    #[test]
    fn test_clear_on_empty_vault() {
        let vault = CredentialVault::new(Box::new(MemoryStore::default()));
        vault.clear().unwrap();
        assert!(vault.get().unwrap().is_none());
    }

    #[test]
    fn test_vault_reads_what_another_instance_stored() {
        let store = MemoryStore::default();

        let first = CredentialVault::new(Box::new(store.clone()));
        first
            .set(Credentials::new("driver@example.com", "hunter2"))
            .unwrap();

        let second = CredentialVault::new(Box::new(store.clone()));
        assert_eq!(
            second.get().unwrap(),
            Some(Credentials::new("driver@example.com", "hunter2"))
        );

        second.clear().unwrap();
        assert!(store.get_secret(SERVICE, USERNAME_KEY).unwrap().is_none());
        assert!(store.get_secret(SERVICE, PASSWORD_KEY).unwrap().is_none());
        assert!(CredentialVault::new(Box::new(store)).get().unwrap().is_none());
    }
}
