//! Remote blob client contract.
//!
//! One encrypted blob per owner, versioned by an opaque content hash. The
//! concrete transport (HTTP calls, auth token acquisition, retry policy)
//! lives behind this trait and is out of scope here; test doubles implement
//! it in-memory.

use crate::error::CloudResult;
use crate::types::RemoteBlob;
use async_trait::async_trait;

/// Conditional get/put/delete of the owner's single remote blob.
#[async_trait]
pub trait RemoteBlobClient: Send + Sync {
    /// Fetches the current blob. An owner with no prior writes yields
    /// [`RemoteBlob::empty`], not an error.
    async fn pull(&self) -> CloudResult<RemoteBlob>;

    /// Conditionally replaces the blob.
    ///
    /// `previous_hash` is the content hash observed on the last pull (`None`
    /// when the remote held nothing). The server must check it atomically and
    /// fail with [`CloudError::Conflict`](crate::CloudError::Conflict) on
    /// mismatch — the sole cross-process consistency mechanism.
    async fn push(
        &self,
        meta: &[u8],
        value: &[u8],
        previous_hash: Option<&str>,
    ) -> CloudResult<RemoteBlob>;

    /// Irreversibly clears the owner's blob, returning the fresh empty record.
    async fn reset(&self) -> CloudResult<RemoteBlob>;
}
