//! SQLite-backed entry store.
//!
//! One `entries` table: name (primary key), data blob, metadata as a JSON
//! text column. Metadata round-trips through `serde_json` so the flat
//! string-to-string shape is enforced at the type level, not by the schema.

use crate::{LocalEntry, LocalEntryStore, StoreError, StoreResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Durable [`LocalEntryStore`] backed by SQLite.
#[derive(Clone)]
pub struct SqliteEntryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEntryStore {
    /// Opens or creates a store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(storage_err)?;
        Self::with_conn(conn)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        Self::with_conn(conn)
    }

    fn with_conn(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS entries (
                name TEXT PRIMARY KEY,
                data BLOB NOT NULL,
                meta TEXT NOT NULL
            )",
        )
        .map_err(storage_err)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Storage("connection mutex poisoned".to_string()))
    }
}

impl LocalEntryStore for SqliteEntryStore {
    fn save(&self, entry: &LocalEntry) -> StoreResult<()> {
        let meta_json = serde_json::to_string(&entry.meta)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO entries (name, data, meta) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET data = ?2, meta = ?3",
            params![entry.name, entry.data, meta_json],
        )
        .map_err(storage_err)?;
        Ok(())
    }

    fn load(&self, name: &str) -> StoreResult<Option<LocalEntry>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT name, data, meta FROM entries WHERE name = ?1",
                params![name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Vec<u8>>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(storage_err)?;

        match row {
            Some((name, data, meta_json)) => {
                let meta: BTreeMap<String, String> = serde_json::from_str(&meta_json)?;
                Ok(Some(LocalEntry { name, data, meta }))
            }
            None => Ok(None),
        }
    }

    fn list(&self) -> StoreResult<Vec<LocalEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT name, data, meta FROM entries ORDER BY name")
            .map_err(storage_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Vec<u8>>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(storage_err)?;

        let mut entries = Vec::new();
        for row in rows {
            let (name, data, meta_json) = row.map_err(storage_err)?;
            let meta: BTreeMap<String, String> = serde_json::from_str(&meta_json)?;
            entries.push(LocalEntry { name, data, meta });
        }
        Ok(entries)
    }

    fn remove(&self, name: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        let affected = conn
            .execute("DELETE FROM entries WHERE name = ?1", params![name])
            .map_err(storage_err)?;
        if affected == 0 {
            return Err(StoreError::NotFound(name.to_string()));
        }
        Ok(())
    }

    fn exists(&self, name: &str) -> StoreResult<bool> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM entries WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .map_err(storage_err)?;
        Ok(count > 0)
    }

    fn clear(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM entries", [])
            .map_err(storage_err)?;
        Ok(())
    }
}

fn storage_err(e: rusqlite::Error) -> StoreError {
    StoreError::Storage(e.to_string())
}
