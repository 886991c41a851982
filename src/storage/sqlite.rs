//! SQLite-backed key-value store.
//!
//! Every key lives in a single `defaults` table with its value kind stored
//! alongside a text encoding of the value. File-backed databases run in WAL
//! mode; `flush` checkpoints the log into the main database file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, params};

use super::traits::{KeyValueStore, StoredValue};
use crate::error::{RateGateError, Result};

/// Persistent store on top of a SQLite database.
///
/// `rusqlite::Connection` isn't `Sync`, so the connection lives behind a
/// `Mutex`; writes are short and need exclusive access anyway.
pub struct SqliteStore {
    path: Option<PathBuf>,
    db: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open or create a database file, creating parent directories as needed.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let db = Connection::open(path)?;
        let mode: String = db.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        log::debug!("Opened {} (journal_mode={})", path.display(), mode);

        Self::init_schema(&db)?;

        Ok(Self {
            path: Some(path.to_path_buf()),
            db: Mutex::new(db),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory()?;
        Self::init_schema(&db)?;
        Ok(Self {
            path: None,
            db: Mutex::new(db),
        })
    }

    /// Location of the database file, if file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        let db = self.lock()?;
        let mut stmt = db.prepare("SELECT key FROM defaults ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }

    fn init_schema(db: &Connection) -> Result<()> {
        db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS defaults (
                key TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|e| RateGateError::Storage(e.to_string()))
    }
}

fn encode(value: &StoredValue) -> String {
    match value {
        StoredValue::Str(s) => s.clone(),
        StoredValue::Int(i) => i.to_string(),
        StoredValue::Double(d) => d.to_string(),
        StoredValue::Bool(b) => b.to_string(),
    }
}

fn invalid(kind: &str, raw: &str) -> RateGateError {
    RateGateError::Storage(format!("Invalid {} value: {:?}", kind, raw))
}

fn decode(kind: &str, raw: String) -> Result<StoredValue> {
    match kind {
        "str" => Ok(StoredValue::Str(raw)),
        "int" => raw.parse().map(StoredValue::Int).map_err(|_| invalid(kind, &raw)),
        "double" => raw.parse().map(StoredValue::Double).map_err(|_| invalid(kind, &raw)),
        "bool" => raw.parse().map(StoredValue::Bool).map_err(|_| invalid(kind, &raw)),
        other => Err(RateGateError::Storage(format!("Unknown value kind: {}", other))),
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        let row = self
            .lock()?
            .query_row("SELECT kind, value FROM defaults WHERE key = ?1", [key], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .optional()?;

        match row {
            Some((kind, raw)) => decode(&kind, raw).map(Some),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: StoredValue) -> Result<()> {
        self.lock()?.execute(
            "INSERT OR REPLACE INTO defaults (key, kind, value, updated_at) VALUES (?1, ?2, ?3, ?4)",
            params![key, value.kind(), encode(&value), chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.execute("DELETE FROM defaults WHERE key = ?1", [key])?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        if self.path.is_some() {
            self.lock()?
                .query_row("PRAGMA wal_checkpoint(PASSIVE)", [], |_| Ok(()))?;
        }
        Ok(())
    }
}
