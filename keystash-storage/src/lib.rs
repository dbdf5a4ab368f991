//! Local entry store for Keystash.
//!
//! Durable named byte-blob storage with a flat string metadata map per entry,
//! used as the offline-readable mirror of the cloud cache. The store itself
//! knows nothing about encryption or timestamps; the synchronization layer
//! smuggles cloud timestamps through reserved metadata keys.

mod sqlite_store;

pub use sqlite_store::SqliteEntryStore;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type for local store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the local entry store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entry not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("metadata serialization error: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// A named byte payload with flat string metadata, as persisted locally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub meta: BTreeMap<String, String>,
}

/// Named byte-blob storage contract consumed by the sync engine.
///
/// Implementations must be safe to share behind an `Arc`; each call is an
/// independent durable operation.
pub trait LocalEntryStore: Send + Sync {
    /// Saves (upserts) an entry.
    fn save(&self, entry: &LocalEntry) -> StoreResult<()>;

    /// Loads an entry by name, or `None` if absent.
    fn load(&self, name: &str) -> StoreResult<Option<LocalEntry>>;

    /// Lists all entries.
    fn list(&self) -> StoreResult<Vec<LocalEntry>>;

    /// Removes an entry by name. Removing an absent name is a
    /// [`StoreError::NotFound`].
    fn remove(&self, name: &str) -> StoreResult<()>;

    /// Returns whether an entry with the given name exists.
    fn exists(&self, name: &str) -> StoreResult<bool>;

    /// Removes every entry.
    fn clear(&self) -> StoreResult<()>;
}
