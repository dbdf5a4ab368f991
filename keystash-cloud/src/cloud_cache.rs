//! Cloud cache — the authoritative in-memory view of the remote blob.
//!
//! Every mutation runs a push cycle: serialize the candidate entry map,
//! encrypt it for the current recipient set, conditionally push it with the
//! last observed content hash, then decrypt the server's response and adopt
//! *that* as the new cache. The server response, not the locally-serialized
//! value, becomes the truth, which tolerates any server-side normalization.
//!
//! The cache starts unhydrated; everything except `retrieve_cloud_entries`
//! and `update_recipients` fails with `OutOfSync` until the first successful
//! pull. A conflicting push is surfaced, never retried silently — a blind
//! retry could drop a concurrent writer's changes.

use crate::blob_client::RemoteBlobClient;
use crate::codec;
use crate::error::{CloudError, CloudResult};
use crate::types::{now_millis, CloudEntry, NewEntry, RemoteBlob};
use keystash_crypto::{BlobCipher, PublicKey, RecipientSet, SecretKey};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Hydrated state: the decrypted entry map plus the optimistic-lock token.
struct CacheState {
    entries: BTreeMap<String, CloudEntry>,
    /// `None` while the remote holds no content yet.
    content_hash: Option<String>,
}

/// In-memory mirror of one owner's remote blob.
///
/// Owns the entry map and the last observed content hash exclusively. One
/// instance per synchronization session; methods take `&mut self`, so a
/// single owner serializes operations by construction.
pub struct CloudKeyCache {
    client: Arc<dyn RemoteBlobClient>,
    cipher: Arc<dyn BlobCipher>,
    recipients: RecipientSet,
    state: Option<CacheState>,
}

impl CloudKeyCache {
    pub fn new(
        client: Arc<dyn RemoteBlobClient>,
        cipher: Arc<dyn BlobCipher>,
        recipients: RecipientSet,
    ) -> Self {
        Self {
            client,
            cipher,
            recipients,
            state: None,
        }
    }

    /// Whether the first successful pull has happened.
    pub fn is_hydrated(&self) -> bool {
        self.state.is_some()
    }

    /// Pulls and decrypts the remote blob, replacing the cache with its
    /// contents. An empty remote state hydrates to an empty entry map.
    pub async fn retrieve_cloud_entries(&mut self) -> CloudResult<()> {
        let blob = self.client.pull().await?;
        let plaintext = self
            .cipher
            .decrypt(&blob.value, &blob.meta, &self.recipients)?;
        let entries = codec::deserialize(&plaintext)?;
        debug!(entries = entries.len(), "hydrated cloud cache");
        self.state = Some(CacheState {
            entries,
            content_hash: hash_token(&blob),
        });
        Ok(())
    }

    /// Pure cache read; no network I/O.
    pub fn retrieve_entry(&self, name: &str) -> CloudResult<CloudEntry> {
        self.hydrated()?
            .entries
            .get(name)
            .cloned()
            .ok_or_else(|| CloudError::EntryMissing(name.to_string()))
    }

    /// Pure cache read; no network I/O.
    pub fn retrieve_all_entries(&self) -> CloudResult<Vec<CloudEntry>> {
        Ok(self.hydrated()?.entries.values().cloned().collect())
    }

    /// Pure cache read; no network I/O.
    pub fn exists_entry(&self, name: &str) -> CloudResult<bool> {
        Ok(self.hydrated()?.entries.contains_key(name))
    }

    /// Stores one entry. See [`CloudKeyCache::store_entries`].
    pub async fn store_entry(
        &mut self,
        name: &str,
        data: &[u8],
        meta: Option<BTreeMap<String, String>>,
    ) -> CloudResult<CloudEntry> {
        let mut stored = self
            .store_entries(vec![NewEntry::new(name, data, meta)])
            .await?;
        stored
            .pop()
            .ok_or_else(|| CloudError::EntryMissing(name.to_string()))
    }

    /// Stores a batch of new entries and pushes the result.
    ///
    /// The whole batch is validated against the cache (and against itself)
    /// before anything mutates; a name collision fails the entire call with
    /// `EntryExists` and leaves the cache untouched. Returns the stored
    /// entries as confirmed by the server's post-write state.
    pub async fn store_entries(&mut self, new_entries: Vec<NewEntry>) -> CloudResult<Vec<CloudEntry>> {
        let state = self.hydrated()?;

        let mut batch_names = BTreeSet::new();
        for entry in &new_entries {
            if state.entries.contains_key(&entry.name) || !batch_names.insert(&entry.name) {
                return Err(CloudError::EntryExists(entry.name.clone()));
            }
        }

        let now = now_millis();
        let mut candidate = state.entries.clone();
        let mut names = Vec::with_capacity(new_entries.len());
        for entry in new_entries {
            names.push(entry.name.clone());
            candidate.insert(
                entry.name.clone(),
                CloudEntry {
                    name: entry.name,
                    data: entry.data,
                    meta: entry.meta,
                    creation_date: now,
                    modification_date: now,
                },
            );
        }

        self.push_cycle(candidate).await?;
        debug!(stored = names.len(), "stored entries");
        self.confirmed(&names)
    }

    /// Replaces an existing entry's data/meta, preserving its creation date
    /// and advancing its modification date.
    pub async fn update_entry(
        &mut self,
        name: &str,
        data: &[u8],
        meta: Option<BTreeMap<String, String>>,
    ) -> CloudResult<CloudEntry> {
        let state = self.hydrated()?;
        let current = state
            .entries
            .get(name)
            .ok_or_else(|| CloudError::EntryMissing(name.to_string()))?;

        let mut candidate = state.entries.clone();
        candidate.insert(
            name.to_string(),
            CloudEntry {
                name: name.to_string(),
                data: data.to_vec(),
                meta,
                creation_date: current.creation_date,
                modification_date: now_millis(),
            },
        );

        self.push_cycle(candidate).await?;
        debug!(%name, "updated entry");
        self.retrieve_entry(name)
    }

    /// Deletes one entry. See [`CloudKeyCache::delete_entries`].
    pub async fn delete_entry(&mut self, name: &str) -> CloudResult<()> {
        self.delete_entries(&[name]).await
    }

    /// Deletes a batch of entries and pushes the result.
    ///
    /// The whole batch is validated before anything mutates; one absent name
    /// fails the entire call with `EntryMissing`.
    pub async fn delete_entries(&mut self, names: &[&str]) -> CloudResult<()> {
        let state = self.hydrated()?;
        for name in names {
            if !state.entries.contains_key(*name) {
                return Err(CloudError::EntryMissing(name.to_string()));
            }
        }

        let mut candidate = state.entries.clone();
        for name in names {
            candidate.remove(*name);
        }

        self.push_cycle(candidate).await?;
        debug!(deleted = names.len(), "deleted entries");
        Ok(())
    }

    /// Clears the cache unconditionally and pushes the empty map.
    pub async fn delete_all_entries(&mut self) -> CloudResult<()> {
        self.hydrated()?;
        self.push_cycle(BTreeMap::new()).await?;
        info!("deleted all entries");
        Ok(())
    }

    /// Irreversibly resets the owner's remote blob, leaving a hydrated empty
    /// cache. Unlike `delete_all_entries` this bypasses the conditional-write
    /// check entirely.
    pub async fn purge(&mut self) -> CloudResult<()> {
        let blob = self.client.reset().await?;
        self.state = Some(CacheState {
            entries: BTreeMap::new(),
            content_hash: hash_token(&blob),
        });
        info!("purged remote blob");
        Ok(())
    }

    /// Re-encrypts the remote blob for a rotated recipient set and adopts the
    /// new identity for all subsequent operations.
    ///
    /// At least one of the two components must be given. Pulls fresh state
    /// first (hydrating the cache if needed); when the remote holds no
    /// content yet there is nothing to re-protect and no push is issued.
    pub async fn update_recipients(
        &mut self,
        new_secret: Option<SecretKey>,
        new_publics: Option<Vec<PublicKey>>,
    ) -> CloudResult<()> {
        if new_secret.is_none() && new_publics.is_none() {
            return Err(CloudError::InvalidArgument(
                "update_recipients requires a new private key or new public keys".to_string(),
            ));
        }

        let blob = self.client.pull().await?;
        let plaintext = self
            .cipher
            .decrypt(&blob.value, &blob.meta, &self.recipients)?;
        let entries = codec::deserialize(&plaintext)?;
        let remote_empty = blob.is_empty();
        self.state = Some(CacheState {
            entries,
            content_hash: hash_token(&blob),
        });

        self.recipients = self.recipients.rotated(new_secret, new_publics);

        if remote_empty {
            debug!("remote blob empty, recipient rotation needs no push");
            return Ok(());
        }

        let candidate = self.hydrated()?.entries.clone();
        self.push_cycle(candidate).await?;
        info!("re-encrypted remote blob for rotated recipient set");
        Ok(())
    }

    fn hydrated(&self) -> CloudResult<&CacheState> {
        self.state.as_ref().ok_or(CloudError::OutOfSync)
    }

    /// Runs one push cycle for a candidate entry map. The cache is replaced
    /// only from the server's confirmed response; on any failure (including
    /// `Conflict`) the prior synced state stays in place and the mutation
    /// simply did not apply.
    async fn push_cycle(&mut self, candidate: BTreeMap<String, CloudEntry>) -> CloudResult<()> {
        let plaintext = codec::serialize(&candidate)?;
        let encrypted = self.cipher.encrypt(&plaintext, &self.recipients)?;

        let previous_hash = self
            .state
            .as_ref()
            .and_then(|s| s.content_hash.as_deref());
        let blob = self
            .client
            .push(&encrypted.meta, &encrypted.value, previous_hash)
            .await?;

        let plaintext = self
            .cipher
            .decrypt(&blob.value, &blob.meta, &self.recipients)?;
        let entries = codec::deserialize(&plaintext)?;
        self.state = Some(CacheState {
            entries,
            content_hash: hash_token(&blob),
        });
        Ok(())
    }

    /// Looks up the server-confirmed copies of freshly stored entries.
    fn confirmed(&self, names: &[String]) -> CloudResult<Vec<CloudEntry>> {
        let state = self.hydrated()?;
        names
            .iter()
            .map(|name| {
                state
                    .entries
                    .get(name)
                    .cloned()
                    .ok_or_else(|| CloudError::EntryMissing(name.clone()))
            })
            .collect()
    }
}

fn hash_token(blob: &RemoteBlob) -> Option<String> {
    if blob.content_hash.is_empty() {
        None
    } else {
        Some(blob.content_hash.clone())
    }
}
