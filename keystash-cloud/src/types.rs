//! Entry model and remote blob value types.

use chrono::{DateTime, TimeZone, Utc};
use keystash_storage::LocalEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved local-metadata key carrying an entry's creation time (epoch millis).
///
/// The local entry store has no first-class timestamp fields, so cloud
/// timestamps ride along in the flat metadata map under these two keys.
pub const CREATION_DATE_KEY: &str = "k_cda";

/// Reserved local-metadata key carrying an entry's modification time (epoch millis).
pub const MODIFICATION_DATE_KEY: &str = "k_mda";

/// A named entry as held by the cloud cache.
///
/// `creation_date` is immutable once set; `modification_date` advances on
/// every store/update that survives a push cycle. Both carry millisecond
/// resolution — the codec's precision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub meta: Option<BTreeMap<String, String>>,
    pub creation_date: DateTime<Utc>,
    pub modification_date: DateTime<Utc>,
}

impl CloudEntry {
    /// Converts to a local mirror entry, encoding both timestamps into the
    /// reserved metadata keys.
    pub fn to_local(&self) -> LocalEntry {
        let mut meta = self.meta.clone().unwrap_or_default();
        meta.insert(
            CREATION_DATE_KEY.to_string(),
            self.creation_date.timestamp_millis().to_string(),
        );
        meta.insert(
            MODIFICATION_DATE_KEY.to_string(),
            self.modification_date.timestamp_millis().to_string(),
        );
        LocalEntry {
            name: self.name.clone(),
            data: self.data.clone(),
            meta,
        }
    }
}

/// Input for a store operation, before timestamps are assigned.
#[derive(Clone, Debug)]
pub struct NewEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub meta: Option<BTreeMap<String, String>>,
}

impl NewEntry {
    pub fn new(
        name: impl Into<String>,
        data: impl Into<Vec<u8>>,
        meta: Option<BTreeMap<String, String>>,
    ) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            meta,
        }
    }
}

/// The single versioned encrypted record held remotely for one owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteBlob {
    /// Ciphertext (or the empty value when no remote state exists yet).
    pub value: Vec<u8>,
    /// Detached encryption metadata.
    pub meta: Vec<u8>,
    /// Server-assigned version, opaque to this layer.
    pub version: String,
    /// Opaque token identifying the current server-side content; the
    /// optimistic-lock precondition for the next conditional write.
    pub content_hash: String,
}

impl RemoteBlob {
    /// The "no remote state yet" record.
    pub fn empty() -> Self {
        Self {
            value: Vec::new(),
            meta: Vec::new(),
            version: String::new(),
            content_hash: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.meta.is_empty()
    }
}

/// Current time truncated to millisecond resolution, so freshly assigned
/// timestamps survive the codec round-trip bit-identically.
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    Utc.timestamp_millis_opt(now.timestamp_millis())
        .single()
        .unwrap_or(now)
}

/// Parses an epoch-millisecond timestamp.
pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// Modification timestamp of a local mirror entry, if its reserved metadata
/// survived intact.
pub fn local_modification_date(entry: &LocalEntry) -> Option<DateTime<Utc>> {
    entry
        .meta
        .get(MODIFICATION_DATE_KEY)?
        .parse::<i64>()
        .ok()
        .and_then(from_millis)
}

/// Creation timestamp of a local mirror entry, if present.
pub fn local_creation_date(entry: &LocalEntry) -> Option<DateTime<Utc>> {
    entry
        .meta
        .get(CREATION_DATE_KEY)?
        .parse::<i64>()
        .ok()
        .and_then(from_millis)
}
