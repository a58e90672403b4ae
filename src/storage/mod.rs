//! Key-value persistence for widget state
//!
//! Consent and gate records live in durable storage that survives restarts
//! ([`SqliteStorage`]); chat history and the contact profile live in
//! session-scoped storage that is gone when the process exits
//! ([`MemoryStorage`]). Both sides store plain JSON strings under fixed keys.

use crate::config::StorageConfig;
use crate::error::{DomassistError, Result};
use anyhow::Context;
use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

pub mod memory;
pub use memory::MemoryStorage;

/// Synchronous string key-value store
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Write all `entries` as one unit: either every value is stored or the
    /// store is left unchanged
    fn set_all(&self, entries: &[(&str, &str)]) -> Result<()>;

    /// Delete `key`; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// Delete all `keys` as one unit: either every key is gone afterwards or
    /// the store is left unchanged
    fn remove_all(&self, keys: &[&str]) -> Result<()>;
}

/// Durable storage backed by a SQLite file
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    db_path: PathBuf,
}

impl SqliteStorage {
    /// Open the store configured in `config`
    ///
    /// Uses `storage.db_path` when set, otherwise `state.db` in the
    /// platform data directory.
    pub fn open(config: &StorageConfig) -> Result<Self> {
        if let Some(path) = &config.db_path {
            return Self::new_with_path(path);
        }

        let proj_dirs = ProjectDirs::from("de", "domassist", "domassist").ok_or_else(|| {
            DomassistError::Persistence("Could not determine data directory".into())
        })?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| DomassistError::Persistence(e.to_string()))?;

        Self::new_with_path(data_dir.join("state.db"))
    }

    /// Create a storage instance that uses the specified database path.
    ///
    /// # Examples
    ///
    /// ```
    /// use domassist::storage::{KeyValueStore, SqliteStorage};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let storage = SqliteStorage::new_with_path(dir.path().join("state.db")).unwrap();
    /// storage.set("greeting", "hallo").unwrap();
    /// assert_eq!(storage.get("greeting").unwrap().as_deref(), Some("hallo"));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| DomassistError::Persistence(e.to_string()))?;
        }

        let storage = Self { db_path };
        storage.init()?;
        Ok(storage)
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| DomassistError::Persistence(e.to_string()).into())
    }

    fn init(&self) -> Result<()> {
        let conn = self.connect()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| DomassistError::Persistence(e.to_string()))?;

        Ok(())
    }
}

impl KeyValueStore for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connect()?;

        let value = conn
            .query_row(
                "SELECT value FROM entries WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query entry")
            .map_err(|e| DomassistError::Persistence(e.to_string()))?;

        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_all(&[(key, value)])
    }

    fn set_all(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut conn = self.connect()?;
        let now = Utc::now().to_rfc3339();

        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| DomassistError::Persistence(e.to_string()))?;

        for (key, value) in entries {
            tx.execute(
                "INSERT INTO entries (key, value, updated_at) VALUES (?, ?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .context("Failed to write entry")
            .map_err(|e| DomassistError::Persistence(e.to_string()))?;
        }

        tx.commit()
            .context("Failed to commit transaction")
            .map_err(|e| DomassistError::Persistence(e.to_string()))?;

        tracing::debug!(entries = entries.len(), "Stored entries");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.remove_all(&[key])
    }

    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        let mut conn = self.connect()?;

        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| DomassistError::Persistence(e.to_string()))?;

        for key in keys {
            tx.execute("DELETE FROM entries WHERE key = ?", params![key])
                .context("Failed to delete entry")
                .map_err(|e| DomassistError::Persistence(e.to_string()))?;
        }

        tx.commit()
            .context("Failed to commit transaction")
            .map_err(|e| DomassistError::Persistence(e.to_string()))?;

        Ok(())
    }
}
