//! Shared test helpers: an in-memory blob server with the conditional-write
//! semantics of the real remote service.

use async_trait::async_trait;
use keystash_cloud::{CloudError, CloudKeyCache, CloudResult, RemoteBlob, RemoteBlobClient};
use keystash_crypto::{EnvelopeCipher, RecipientSet, SecretKey};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct ServerState {
    value: Vec<u8>,
    meta: Vec<u8>,
    version: u64,
}

/// In-memory stand-in for the remote blob service. Clones share one record,
/// modeling several devices hitting the same owner's blob.
#[derive(Clone, Default)]
pub struct InMemoryBlobServer {
    state: Arc<Mutex<ServerState>>,
}

impl InMemoryBlobServer {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(state: &ServerState) -> RemoteBlob {
        let content_hash = if state.value.is_empty() && state.meta.is_empty() {
            String::new()
        } else {
            let mut hasher = Sha256::new();
            hasher.update(&state.meta);
            hasher.update(&state.value);
            hex::encode(hasher.finalize())
        };
        RemoteBlob {
            value: state.value.clone(),
            meta: state.meta.clone(),
            version: state.version.to_string(),
            content_hash,
        }
    }
}

#[async_trait]
impl RemoteBlobClient for InMemoryBlobServer {
    async fn pull(&self) -> CloudResult<RemoteBlob> {
        let state = self.state.lock().await;
        Ok(Self::snapshot(&state))
    }

    async fn push(
        &self,
        meta: &[u8],
        value: &[u8],
        previous_hash: Option<&str>,
    ) -> CloudResult<RemoteBlob> {
        let mut state = self.state.lock().await;
        let current = Self::snapshot(&state);
        let current_hash =
            (!current.content_hash.is_empty()).then_some(current.content_hash.as_str());
        // The atomic check-and-set the whole protocol hangs on.
        if previous_hash != current_hash {
            return Err(CloudError::Conflict);
        }
        state.meta = meta.to_vec();
        state.value = value.to_vec();
        state.version += 1;
        Ok(Self::snapshot(&state))
    }

    async fn reset(&self) -> CloudResult<RemoteBlob> {
        let mut state = self.state.lock().await;
        state.value.clear();
        state.meta.clear();
        state.version += 1;
        Ok(Self::snapshot(&state))
    }
}

/// A cache wired to the shared server with a self-only identity.
pub fn cache_for(server: &InMemoryBlobServer, secret: SecretKey) -> CloudKeyCache {
    CloudKeyCache::new(
        Arc::new(server.clone()),
        Arc::new(EnvelopeCipher),
        RecipientSet::self_only(secret),
    )
}

/// A cache wired to the shared server with an explicit recipient set.
pub fn cache_with_recipients(server: &InMemoryBlobServer, recipients: RecipientSet) -> CloudKeyCache {
    CloudKeyCache::new(Arc::new(server.clone()), Arc::new(EnvelopeCipher), recipients)
}
