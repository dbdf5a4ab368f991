//! Deterministic two-way mapping between an entry map and the blob that gets
//! encrypted and stored remotely.
//!
//! Wire format: one JSON object keyed by entry name. Payloads are base64
//! text, timestamps are epoch milliseconds. `BTreeMap` keeps the encoding
//! deterministic per input; order across entries carries no meaning.

use crate::error::{CloudError, CloudResult};
use crate::types::{from_millis, CloudEntry};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize)]
struct WireEntry {
    data: String,
    creation_date: i64,
    modification_date: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    meta: Option<BTreeMap<String, String>>,
}

/// Serializes an entry map into a plaintext blob.
pub fn serialize(entries: &BTreeMap<String, CloudEntry>) -> CloudResult<Vec<u8>> {
    let mut wire: BTreeMap<&str, WireEntry> = BTreeMap::new();
    for (name, entry) in entries {
        wire.insert(
            name,
            WireEntry {
                data: BASE64.encode(&entry.data),
                creation_date: entry.creation_date.timestamp_millis(),
                modification_date: entry.modification_date.timestamp_millis(),
                meta: entry.meta.clone(),
            },
        );
    }
    Ok(serde_json::to_vec(&wire)?)
}

/// Deserializes a plaintext blob back into an entry map.
///
/// A zero-length blob is the "no remote state yet" case and yields the empty
/// map, never an error.
pub fn deserialize(blob: &[u8]) -> CloudResult<BTreeMap<String, CloudEntry>> {
    if blob.is_empty() {
        return Ok(BTreeMap::new());
    }

    let wire: BTreeMap<String, WireEntry> = serde_json::from_slice(blob)?;
    let mut entries = BTreeMap::new();
    for (name, w) in wire {
        let data = BASE64
            .decode(&w.data)
            .map_err(|e| CloudError::Codec(format!("entry {name}: {e}")))?;
        let creation_date = from_millis(w.creation_date)
            .ok_or_else(|| CloudError::Codec(format!("entry {name}: bad creation date")))?;
        let modification_date = from_millis(w.modification_date)
            .ok_or_else(|| CloudError::Codec(format!("entry {name}: bad modification date")))?;
        entries.insert(
            name.clone(),
            CloudEntry {
                name,
                data,
                meta: w.meta,
                creation_date,
                modification_date,
            },
        );
    }
    Ok(entries)
}
