//! Error taxonomy for the synchronization layer.

use thiserror::Error;

/// Result type for sync operations.
pub type CloudResult<T> = Result<T, CloudError>;

/// Errors surfaced by the cloud cache and sync engine.
///
/// Batch operations validate their whole batch before mutating anything, so
/// a precondition error never leaves a partial write behind.
#[derive(Debug, Error)]
pub enum CloudError {
    /// The cloud cache was read or mutated before its first successful pull.
    #[error("cloud cache not hydrated: pull before reading or mutating")]
    OutOfSync,

    #[error("entry already exists: {0}")]
    EntryExists(String),

    #[error("entry doesn't exist: {0}")]
    EntryMissing(String),

    /// The remote content hash moved between our last pull and this push.
    /// Never retried automatically; the caller must re-sync first.
    #[error("remote blob changed since last pull: re-sync and retry")]
    Conflict,

    #[error("crypto error: {0}")]
    Crypto(#[from] keystash_crypto::CryptoError),

    #[error("local store error: {0}")]
    Store(#[from] keystash_storage::StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("malformed blob payload: {0}")]
    Codec(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
