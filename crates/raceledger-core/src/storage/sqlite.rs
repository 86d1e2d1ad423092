//! SQLite backend
//!
//! One flat `results` table. The four canonical columns are the ones the
//! first database revision created; the remote-only columns are added by
//! [`SqliteBackend::ensure_schema`] when missing, so older databases keep
//! loading and gain the new columns on first use.
//!
//! Saving replaces the full table contents inside one transaction. Row order
//! (`rowid`) is ledger order, newest first. The pending entry lives in the
//! single-row `pending_entry` table and is written in the same transaction.

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, ErrorCode, Row};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::{CorruptStoreError, LoadError, PersistenceBackend, PersistenceError, StoredLedger};
use crate::record::{PendingEntry, RaceResult};

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS results (
        car_model TEXT,
        incidents_count INTEGER,
        position_in_race INTEGER,
        track_name TEXT
    )
";

const CREATE_PENDING: &str = "
    CREATE TABLE IF NOT EXISTS pending_entry (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        car_model TEXT,
        incidents_count INTEGER,
        position_in_race INTEGER,
        track_name TEXT
    )
";

const SELECT_PENDING: &str = "
    SELECT car_model, incidents_count, position_in_race, track_name
    FROM pending_entry
    WHERE id = 1
";

const INSERT_PENDING: &str = "
    INSERT INTO pending_entry (id, car_model, incidents_count, position_in_race, track_name)
    VALUES (1, ?1, ?2, ?3, ?4)
";

/// Columns every revision of the `results` table has
const CANONICAL_COLUMNS: [&str; 4] = ["car_model", "incidents_count", "position_in_race", "track_name"];

/// Columns added after the first revision, with their SQL types
const EXTENDED_COLUMNS: &[(&str, &str)] = &[
    ("series_name", "TEXT"),
    ("start_position", "INTEGER"),
    ("finish_position", "INTEGER"),
    ("points", "INTEGER"),
    ("strength_of_field", "INTEGER"),
    ("oldi_rating", "INTEGER"),
    ("newi_rating", "INTEGER"),
    ("laps_led", "INTEGER"),
    ("car_id", "INTEGER"),
    ("session_start", "TEXT"),
];

const SELECT_ALL: &str = "
    SELECT car_model, incidents_count, position_in_race, track_name,
           series_name, start_position, finish_position, points, strength_of_field,
           oldi_rating, newi_rating, laps_led, car_id, session_start
    FROM results
    ORDER BY rowid ASC
";

const INSERT: &str = "
    INSERT INTO results (
        car_model, incidents_count, position_in_race, track_name,
        series_name, start_position, finish_position, points, strength_of_field,
        oldi_rating, newi_rating, laps_led, car_id, session_start
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
";

/// Column names in `SELECT_ALL` order
const SELECTED_COLUMNS: [&str; 14] = [
    "car_model",
    "incidents_count",
    "position_in_race",
    "track_name",
    "series_name",
    "start_position",
    "finish_position",
    "points",
    "strength_of_field",
    "oldi_rating",
    "newi_rating",
    "laps_led",
    "car_id",
    "session_start",
];

/// Ledger stored in an embedded SQLite database
pub struct SqliteBackend {
    conn: Connection,
    /// `None` for in-memory databases
    path: Option<PathBuf>,
    schema_ready: bool,
}

impl SqliteBackend {
    /// Default file name inside the data directory
    pub const FILE_NAME: &'static str = "results.db";

    /// Open (or create) the database at `path`.
    ///
    /// The schema is checked lazily on first load or save, so a file that is
    /// not a database is reported as corrupt by [`PersistenceBackend::load`]
    /// instead of failing here.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        Ok(Self {
            conn,
            path: Some(path),
            schema_ready: false,
        })
    }

    /// Private in-memory database, mostly for tests
    pub fn in_memory() -> Result<Self, PersistenceError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
            schema_ready: false,
        })
    }

    /// Create the tables and add any columns missing from older revisions.
    ///
    /// Tables that exist but lack a canonical column were not written by
    /// this program; that is reported as `SQLITE_CORRUPT` so the database
    /// gets quarantined like any other unreadable one.
    pub fn ensure_schema(&mut self) -> Result<(), rusqlite::Error> {
        if self.schema_ready {
            return Ok(());
        }

        self.conn.execute_batch(CREATE_TABLE)?;
        let existing = self.column_names("results")?;
        require_columns("results", &existing, &CANONICAL_COLUMNS)?;

        self.conn.execute_batch(CREATE_PENDING)?;
        let pending = self.column_names("pending_entry")?;
        require_columns("pending_entry", &pending, &CANONICAL_COLUMNS)?;
        require_columns("pending_entry", &pending, &["id"])?;

        for (name, sql_type) in EXTENDED_COLUMNS {
            if !existing.contains(*name) {
                tracing::debug!("Adding column '{}' to results table", name);
                self.conn.execute(
                    &format!("ALTER TABLE results ADD COLUMN {} {}", name, sql_type),
                    [],
                )?;
            }
        }

        self.schema_ready = true;
        Ok(())
    }

    fn column_names(&self, table: &str) -> Result<HashSet<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
        names.collect()
    }

    fn read_rows(&mut self) -> Result<Vec<Value>, rusqlite::Error> {
        self.ensure_schema()?;
        let mut stmt = self.conn.prepare(SELECT_ALL)?;
        let rows = stmt.query_map([], row_to_value)?;
        rows.collect()
    }

    /// Pending fields with a wrong type read as unset
    fn read_pending(&self) -> Result<PendingEntry, rusqlite::Error> {
        let mut stmt = self.conn.prepare(SELECT_PENDING)?;
        let mut rows = stmt.query([])?;
        let Some(row) = rows.next()? else {
            return Ok(PendingEntry::default());
        };

        Ok(PendingEntry {
            car_model: row.get::<_, Option<String>>(0).ok().flatten(),
            incidents_count: row.get::<_, Option<u32>>(1).ok().flatten(),
            position_in_race: row.get::<_, Option<u32>>(2).ok().flatten(),
            track_name: row.get::<_, Option<String>>(3).ok().flatten(),
        })
    }

    fn read_all(&mut self) -> Result<StoredLedger, rusqlite::Error> {
        let records = self.read_rows()?;
        let pending = self.read_pending()?;
        Ok(StoredLedger { pending, records })
    }

    /// Move an unreadable database aside and start over with an empty one
    fn quarantine(&mut self) -> Result<(), PersistenceError> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };

        // Close the handle first; some platforms refuse to rename open files
        let old = std::mem::replace(&mut self.conn, Connection::open_in_memory()?);
        if let Err((_, e)) = old.close() {
            tracing::warn!("Closing unreadable database failed: {}", e);
        }

        let mut name = path.as_os_str().to_os_string();
        name.push(".corrupt");
        fs::rename(&path, PathBuf::from(name))?;

        self.conn = Connection::open(&path)?;
        self.schema_ready = false;
        Ok(())
    }
}

impl PersistenceBackend for SqliteBackend {
    fn load(&mut self) -> Result<Option<StoredLedger>, LoadError> {
        match self.read_all() {
            Ok(stored) => Ok(Some(stored)),
            Err(e) if is_corruption(&e) => {
                let reason = e.to_string();
                if let Err(qe) = self.quarantine() {
                    tracing::warn!("Could not move unreadable database aside: {}", qe);
                }
                Err(LoadError::Corrupt(CorruptStoreError {
                    location: self.describe(),
                    reason,
                }))
            }
            Err(e) => Err(LoadError::Io(e.into())),
        }
    }

    fn save(
        &mut self,
        records: &[RaceResult],
        pending: &PendingEntry,
    ) -> Result<(), PersistenceError> {
        self.ensure_schema()?;

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM results", [])?;
        {
            let mut stmt = tx.prepare(INSERT)?;
            for rec in records {
                let remote = rec.remote.as_ref();
                stmt.execute(params![
                    rec.car_model,
                    rec.incidents_count,
                    rec.position_in_race,
                    rec.track_name,
                    remote.map(|r| r.series_name.as_str()),
                    remote.map(|r| r.start_position),
                    remote.map(|r| r.finish_position),
                    remote.map(|r| r.points),
                    remote.map(|r| r.strength_of_field),
                    remote.map(|r| r.oldi_rating),
                    remote.map(|r| r.newi_rating),
                    remote.map(|r| r.laps_led),
                    remote.map(|r| r.car_id),
                    remote.map(|r| r.session_start.as_str()),
                ])?;
            }
        }
        tx.execute("DELETE FROM pending_entry", [])?;
        if !pending.is_empty() {
            tx.execute(
                INSERT_PENDING,
                params![
                    pending.car_model,
                    pending.incidents_count,
                    pending.position_in_race,
                    pending.track_name,
                ],
            )?;
        }
        tx.commit()?;

        tracing::debug!("Saved {} results to {}", records.len(), self.describe());
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("sqlite {}", path.display()),
            None => "sqlite (in memory)".to_string(),
        }
    }
}

/// Convert a row into the mapping form the record decoder understands.
///
/// SQLite columns are loosely typed, so values are carried over as-is and
/// type mismatches surface as per-record schema errors.
fn row_to_value(row: &Row<'_>) -> rusqlite::Result<Value> {
    let mut map = Map::new();
    for (idx, name) in SELECTED_COLUMNS.iter().enumerate() {
        let value = match row.get_ref(idx)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::from(i),
            ValueRef::Real(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ValueRef::Text(bytes) => Value::from(String::from_utf8_lossy(bytes).into_owned()),
            // no record field is binary
            ValueRef::Blob(_) => Value::Array(Vec::new()),
        };
        map.insert((*name).to_string(), value);
    }
    Ok(Value::Object(map))
}

fn require_columns(
    table: &str,
    existing: &HashSet<String>,
    required: &[&str],
) -> Result<(), rusqlite::Error> {
    match required.iter().find(|name| !existing.contains(**name)) {
        None => Ok(()),
        Some(missing) => Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CORRUPT),
            Some(format!("table {} has no column '{}'", table, missing)),
        )),
    }
}

fn is_corruption(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::NotADatabase) | Some(ErrorCode::DatabaseCorrupt)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::decode;

    #[test]
    fn test_migrates_first_revision_table() {
        let mut backend = SqliteBackend::in_memory().unwrap();
        backend.conn.execute_batch(CREATE_TABLE).unwrap();
        backend
            .conn
            .execute(
                "INSERT INTO results (car_model, incidents_count, position_in_race, track_name)
                 VALUES ('Legends Ford 34 Coupe', 1, 2, 'Charlotte')",
                [],
            )
            .unwrap();

        let stored = backend.load().unwrap().unwrap();
        assert_eq!(stored.records.len(), 1);

        let rec = decode(&stored.records[0]).unwrap();
        assert_eq!(rec.car_model, "Legends Ford 34 Coupe");
        assert_eq!(rec.position_in_race, Some(2));
        assert!(rec.remote.is_none());

        let columns: Vec<String> = {
            let mut stmt = backend.conn.prepare("PRAGMA table_info(results)").unwrap();
            let names = stmt.query_map([], |row| row.get::<_, String>(1)).unwrap();
            names.collect::<Result<_, _>>().unwrap()
        };
        assert_eq!(columns.len(), 4 + EXTENDED_COLUMNS.len());
    }

    #[test]
    fn test_pending_entry_round_trip() {
        let mut backend = SqliteBackend::in_memory().unwrap();
        let pending = PendingEntry {
            car_model: Some("Dallara F3".to_string()),
            position_in_race: Some(4),
            ..PendingEntry::default()
        };
        backend.save(&[], &pending).unwrap();
        assert_eq!(backend.load().unwrap().unwrap().pending, pending);

        backend.save(&[], &PendingEntry::default()).unwrap();
        assert!(backend.load().unwrap().unwrap().pending.is_empty());
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let mut backend = SqliteBackend::in_memory().unwrap();
        backend.ensure_schema().unwrap();
        backend.schema_ready = false;
        backend.ensure_schema().unwrap();
    }

    #[test]
    fn test_mistyped_row_surfaces_as_schema_error() {
        let mut backend = SqliteBackend::in_memory().unwrap();
        backend.ensure_schema().unwrap();
        backend
            .conn
            .execute(
                "INSERT INTO results (car_model, incidents_count, track_name)
                 VALUES ('Street Stock', 'several', 'Lanier')",
                [],
            )
            .unwrap();

        let stored = backend.load().unwrap().unwrap();
        assert!(decode(&stored.records[0]).is_err());
    }

    #[test]
    fn test_foreign_results_table_is_corruption() {
        let mut backend = SqliteBackend::in_memory().unwrap();
        backend
            .conn
            .execute_batch("CREATE TABLE results (id INTEGER PRIMARY KEY, note TEXT)")
            .unwrap();

        let err = backend.ensure_schema().unwrap_err();
        assert!(is_corruption(&err));
        assert!(err.to_string().contains("car_model"));
    }
}
