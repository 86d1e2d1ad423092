//! JSON document backend
//!
//! Layout of `results.json`:
//!
//! ```text
//! {
//!   "car_model": ..., "incidents_count": ..., "position_in_race": ..., "track_name": ...,
//!   "results_history": [ { "car_model": ..., ... }, ... ]
//! }
//! ```
//!
//! The four top-level fields hold the pending entry (all may be `null`).
//! `results_history` is newest first.

use serde_json::{Map, Value};
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::{CorruptStoreError, LoadError, PersistenceBackend, PersistenceError, StoredLedger};
use crate::record::{encode, PendingEntry, RaceResult};

/// Whole-ledger JSON document on disk
#[derive(Debug, Clone)]
pub struct DocumentBackend {
    path: PathBuf,
}

impl DocumentBackend {
    /// Default file name inside the data directory
    pub const FILE_NAME: &'static str = "results.json";

    /// Use the document at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use `results.json` inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(Self::FILE_NAME))
    }

    /// Path of the document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path an unreadable document is copied to before it gets overwritten
    pub fn quarantine_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from(Self::FILE_NAME));
        name.push(".corrupt");
        self.path.with_file_name(name)
    }

    fn corrupt(&self, reason: impl Into<String>) -> LoadError {
        let reason = reason.into();
        match fs::copy(&self.path, self.quarantine_path()) {
            Ok(_) => tracing::warn!(
                "Kept a copy of unreadable ledger document at {}",
                self.quarantine_path().display()
            ),
            Err(e) => tracing::warn!(
                "Could not keep a copy of unreadable ledger document {}: {}",
                self.path.display(),
                e
            ),
        }

        LoadError::Corrupt(CorruptStoreError {
            location: self.path.display().to_string(),
            reason,
        })
    }
}

impl PersistenceBackend for DocumentBackend {
    fn load(&mut self) -> Result<Option<StoredLedger>, LoadError> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LoadError::Io(e.into())),
        };

        let document: Value = match serde_json::from_slice(&content) {
            Ok(doc) => doc,
            Err(e) => return Err(self.corrupt(e.to_string())),
        };

        let Value::Object(map) = document else {
            return Err(self.corrupt("top level is not an object"));
        };

        let records = match map.get("results_history") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(_) => return Err(self.corrupt("results_history is not an array")),
        };

        Ok(Some(StoredLedger {
            pending: pending_from_document(&map),
            records,
        }))
    }

    fn save(
        &mut self,
        records: &[RaceResult],
        pending: &PendingEntry,
    ) -> Result<(), PersistenceError> {
        let mut map = Map::new();
        map.insert("car_model".into(), Value::from(pending.car_model.clone()));
        map.insert("incidents_count".into(), Value::from(pending.incidents_count));
        map.insert("position_in_race".into(), Value::from(pending.position_in_race));
        map.insert("track_name".into(), Value::from(pending.track_name.clone()));
        map.insert(
            "results_history".into(),
            Value::Array(records.iter().map(encode).collect()),
        );
        let content = serde_json::to_vec_pretty(&Value::Object(map))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        // Write next to the target so the final rename stays on one filesystem
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&content)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        tracing::debug!(
            "Saved {} results to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("document {}", self.path.display())
    }
}

/// Read the legacy top-level scratch fields, dropping any with the wrong type
fn pending_from_document(map: &Map<String, Value>) -> PendingEntry {
    let text = |key: &str| match map.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(_) => {
            tracing::warn!("Ignoring pending '{}' with unexpected type", key);
            None
        }
    };
    let count = |key: &str| match map.get(key) {
        Some(Value::Null) | None => None,
        Some(v) => {
            let n = v.as_u64().and_then(|n| u32::try_from(n).ok());
            if n.is_none() {
                tracing::warn!("Ignoring pending '{}' with unexpected value {}", key, v);
            }
            n
        }
    };

    PendingEntry {
        car_model: text("car_model"),
        incidents_count: count("incidents_count"),
        position_in_race: count("position_in_race"),
        track_name: text("track_name"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quarantine_path() {
        let backend = DocumentBackend::new("/tmp/ledger/results.json");
        assert_eq!(
            backend.quarantine_path(),
            PathBuf::from("/tmp/ledger/results.json.corrupt")
        );
    }

    #[test]
    fn test_pending_from_document_drops_bad_types() {
        let doc = json!({
            "car_model": "Radical SR8",
            "incidents_count": "lots",
            "position_in_race": 3,
            "track_name": null,
        });
        let Value::Object(map) = doc else { unreachable!() };

        let pending = pending_from_document(&map);
        assert_eq!(pending.car_model.as_deref(), Some("Radical SR8"));
        assert_eq!(pending.incidents_count, None);
        assert_eq!(pending.position_in_race, Some(3));
        assert_eq!(pending.track_name, None);
    }
}
