//! Key/value persistence for timer state, settings and statistics.
//!
//! Records are stored as JSON strings. Reads and writes through
//! [`load_record`] and [`save_record`] are best-effort: failures are logged
//! and absorbed so the in-memory engine keeps working.

use directories::ProjectDirs;
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::warn;

pub const STATE_KEY: &str = "timer-state";
pub const SETTINGS_KEY: &str = "timer-settings";
pub const STATS_KEY: &str = "timer-stats";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to create database directory")]
    DirectoryCreation,
}

/// A durable string store addressed by key.
pub trait Store: Send {
    fn load(&self, key: &str) -> Result<Option<String>, DatabaseError>;
    fn save(&self, key: &str, value: &str) -> Result<(), DatabaseError>;
}

/// Reads and decodes a record. Missing, unreadable and malformed records
/// all come back as `None`.
pub fn load_record<T: DeserializeOwned>(store: &dyn Store, key: &str) -> Option<T> {
    let raw = match store.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "failed to read record");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "ignoring malformed record");
            None
        }
    }
}

/// Encodes and writes a record, logging instead of failing.
pub fn save_record<T: Serialize>(store: &dyn Store, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(DatabaseError::from)
        .and_then(|json| store.save(key, &json));

    if let Err(e) = result {
        warn!(key, error = %e, "failed to persist record");
    }
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens the database in the platform data directory, creating it if needed.
    pub fn new() -> Result<Self, DatabaseError> {
        Self::open(&Self::db_path())
    }

    /// Opens (or creates) a database file at `path`.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|_| DatabaseError::DirectoryCreation)?;
        }

        let conn = Connection::open(path)?;
        Self::initialize_tables(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database. Nothing survives the process.
    pub fn new_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_tables(&conn)?;
        Ok(Self { conn })
    }

    fn initialize_tables(conn: &Connection) -> Result<(), DatabaseError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    fn db_path() -> PathBuf {
        ProjectDirs::from("com", "pomotick", "Pomotick")
            .map(|dirs| dirs.data_dir().join("pomotick.db"))
            .unwrap_or_else(|| PathBuf::from("pomotick.db"))
    }
}

impl Store for Database {
    fn load(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row("SELECT value FROM records WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO records (key, value) VALUES (?, ?)",
            [key, value],
        )?;
        Ok(())
    }
}

/// A process-local store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
