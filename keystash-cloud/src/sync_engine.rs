//! Sync engine — reconciles the cloud cache with the local entry store.
//!
//! A pure coordinator: it holds no entry state of its own, only handles to
//! the cloud cache (serialized behind a mutex) and the local store. Reads
//! are served locally for offline capability; mutations go cloud-first for
//! stores/updates and local-first for deletes, mirroring the result so both
//! sides converge.

use crate::cloud_cache::CloudKeyCache;
use crate::error::{CloudError, CloudResult};
use crate::types::{local_modification_date, CloudEntry, NewEntry};
use keystash_crypto::{PublicKey, SecretKey};
use keystash_storage::{LocalEntry, LocalEntryStore};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// CRUD surface that keeps the remote blob, the cloud cache, and the local
/// entry store consistent.
pub struct SyncKeyStore {
    cloud: Mutex<CloudKeyCache>,
    local: Arc<dyn LocalEntryStore>,
}

impl SyncKeyStore {
    pub fn new(cloud: CloudKeyCache, local: Arc<dyn LocalEntryStore>) -> Self {
        Self {
            cloud: Mutex::new(cloud),
            local,
        }
    }

    /// Pulls the cloud cache and reconciles the local store against it.
    ///
    /// The cloud cache is authoritative for existence: local entries absent
    /// from the cloud are removed. Content flows cloud→local only when the
    /// cloud copy is strictly newer (or the local timestamp bookkeeping is
    /// missing); an equal timestamp keeps the local copy unchanged.
    pub async fn sync(&self) -> CloudResult<()> {
        let cloud_entries = {
            let mut cloud = self.cloud.lock().await;
            cloud.retrieve_cloud_entries().await?;
            cloud.retrieve_all_entries()?
        };
        let local_entries = self.local.list()?;

        let cloud_names: BTreeSet<&str> =
            cloud_entries.iter().map(|e| e.name.as_str()).collect();
        let local_by_name: BTreeMap<&str, &LocalEntry> = local_entries
            .iter()
            .map(|e| (e.name.as_str(), e))
            .collect();

        let mut removed = 0usize;
        for entry in &local_entries {
            if !cloud_names.contains(entry.name.as_str()) {
                self.local.remove(&entry.name)?;
                removed += 1;
            }
        }

        let mut stored = 0usize;
        for entry in &cloud_entries {
            let stale = match local_by_name.get(entry.name.as_str()) {
                None => true,
                Some(local) => match local_modification_date(local) {
                    // Tie keeps the local copy: no redundant write.
                    Some(local_mod) => local_mod < entry.modification_date,
                    // Lost its timestamp bookkeeping, cannot be trusted newer.
                    None => true,
                },
            };
            if stale {
                self.local.save(&entry.to_local())?;
                stored += 1;
            }
        }

        info!(stored, removed, "synchronized local store with cloud");
        Ok(())
    }

    /// Stores one entry in both stores. See [`SyncKeyStore::store_entries`].
    pub async fn store_entry(
        &self,
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

    /// Stores a batch of entries: cloud first, then mirrored locally.
    ///
    /// Names are pre-checked against the local store to fail fast without a
    /// wasted round trip; the cloud cache re-validates authoritatively. The
    /// pre-check can race concurrent external modification — accepted as a
    /// best-effort fast-fail.
    pub async fn store_entries(&self, entries: Vec<NewEntry>) -> CloudResult<Vec<CloudEntry>> {
        for entry in &entries {
            if self.local.exists(&entry.name)? {
                return Err(CloudError::EntryExists(entry.name.clone()));
            }
        }

        let stored = {
            let mut cloud = self.cloud.lock().await;
            cloud.store_entries(entries).await?
        };

        for entry in &stored {
            self.local.save(&entry.to_local())?;
        }
        debug!(stored = stored.len(), "stored and mirrored entries");
        Ok(stored)
    }

    /// Updates an existing entry in both stores.
    pub async fn update_entry(
        &self,
        name: &str,
        data: &[u8],
        meta: Option<BTreeMap<String, String>>,
    ) -> CloudResult<CloudEntry> {
        if !self.local.exists(name)? {
            return Err(CloudError::EntryMissing(name.to_string()));
        }

        let updated = {
            let mut cloud = self.cloud.lock().await;
            cloud.update_entry(name, data, meta).await?
        };

        self.local.save(&updated.to_local())?;
        debug!(%name, "updated and mirrored entry");
        Ok(updated)
    }

    /// Offline-capable read from the local store; does not consult the cloud.
    pub fn retrieve_entry(&self, name: &str) -> CloudResult<LocalEntry> {
        self.local
            .load(name)?
            .ok_or_else(|| CloudError::EntryMissing(name.to_string()))
    }

    /// Offline-capable read from the local store; does not consult the cloud.
    pub fn retrieve_all_entries(&self) -> CloudResult<Vec<LocalEntry>> {
        Ok(self.local.list()?)
    }

    /// Offline-capable read from the local store; does not consult the cloud.
    pub fn exists_entry(&self, name: &str) -> CloudResult<bool> {
        Ok(self.local.exists(name)?)
    }

    /// Deletes one entry from both stores. See [`SyncKeyStore::delete_entries`].
    pub async fn delete_entry(&self, name: &str) -> CloudResult<()> {
        self.delete_entries(&[name]).await
    }

    /// Deletes a batch of entries, local store first, then the cloud.
    ///
    /// Known non-atomicity: if the cloud half fails, the local store is
    /// already mutated and stays ahead of the remote until the next `sync()`
    /// (which will not resurrect the entry).
    pub async fn delete_entries(&self, names: &[&str]) -> CloudResult<()> {
        for name in names {
            if !self.local.exists(name)? {
                return Err(CloudError::EntryMissing(name.to_string()));
            }
        }

        for name in names {
            self.local.remove(name)?;
        }

        let mut cloud = self.cloud.lock().await;
        cloud.delete_entries(names).await?;
        debug!(deleted = names.len(), "deleted entries from both stores");
        Ok(())
    }

    /// Clears the local store entirely, then the cloud cache.
    pub async fn delete_all_entries(&self) -> CloudResult<()> {
        self.local.clear()?;
        let mut cloud = self.cloud.lock().await;
        cloud.delete_all_entries().await
    }

    /// Rotates the remote blob's recipient set. The local store is untouched;
    /// a subsequent `sync()` reconciles content, which the rotation did not
    /// change.
    pub async fn update_recipients(
        &self,
        new_secret: Option<SecretKey>,
        new_publics: Option<Vec<PublicKey>>,
    ) -> CloudResult<()> {
        let mut cloud = self.cloud.lock().await;
        cloud.update_recipients(new_secret, new_publics).await
    }
}
