//! Results Ledger
//!
//! A bounded, newest-first history of race results that is written through
//! to a [`PersistenceBackend`](crate::storage::PersistenceBackend) on every
//! mutation.
//!
//! ## Eviction
//!
//! Strict FIFO by age at a fixed capacity ([`LEDGER_CAPACITY`]). Adding to a
//! full ledger drops the oldest record. Duplicates are kept as distinct
//! entries; records carry no identity key.

mod error;
mod shared;
mod store;

pub use error::LedgerError;
pub use shared::SharedLedger;
pub use store::{LedgerStore, LoadOutcome};

use crate::record::RaceResult;

/// Maximum number of results kept
pub const LEDGER_CAPACITY: usize = 15;

/// Ordered, bounded sequence of results, newest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    records: Vec<RaceResult>,
    capacity: usize,
}

impl Ledger {
    /// Empty ledger with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(LEDGER_CAPACITY)
    }

    /// Empty ledger holding at most `capacity` records (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Build from records ordered newest first, keeping the newest `capacity`
    pub fn from_records(records: impl IntoIterator<Item = RaceResult>, capacity: usize) -> Self {
        let mut ledger = Self::with_capacity(capacity);
        ledger
            .records
            .extend(records.into_iter().take(ledger.capacity));
        ledger
    }

    /// Insert at the head. Returns the evicted tail record, if any.
    pub fn push(&mut self, record: RaceResult) -> Option<RaceResult> {
        self.records.insert(0, record);
        if self.records.len() > self.capacity {
            self.records.pop()
        } else {
            None
        }
    }

    /// Number of records held
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records are held
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of records kept
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records, newest first
    pub fn as_slice(&self) -> &[RaceResult] {
        &self.records
    }

    /// Drop every record
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(n: u32) -> RaceResult {
        RaceResult::manual(format!("Car {}", n), n, Some(n), "Spa").unwrap()
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut ledger = Ledger::with_capacity(3);
        assert_eq!(ledger.push(result(1)), None);
        assert_eq!(ledger.push(result(2)), None);
        assert_eq!(ledger.push(result(3)), None);
        assert_eq!(ledger.push(result(4)), Some(result(1)));

        let cars: Vec<&str> = ledger.as_slice().iter().map(|r| r.car_model.as_str()).collect();
        assert_eq!(cars, vec!["Car 4", "Car 3", "Car 2"]);
    }

    #[test]
    fn test_duplicates_are_preserved() {
        let mut ledger = Ledger::new();
        ledger.push(result(1));
        ledger.push(result(1));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.as_slice()[0], ledger.as_slice()[1]);
    }

    #[test]
    fn test_from_records_keeps_newest() {
        let ledger = Ledger::from_records((1..=20).rev().map(result), LEDGER_CAPACITY);
        assert_eq!(ledger.len(), LEDGER_CAPACITY);
        assert_eq!(ledger.as_slice()[0], result(20));
        assert_eq!(ledger.as_slice()[14], result(6));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut ledger = Ledger::with_capacity(0);
        ledger.push(result(1));
        ledger.push(result(2));
        assert_eq!(ledger.capacity(), 1);
        assert_eq!(ledger.as_slice(), &[result(2)]);
    }
}
