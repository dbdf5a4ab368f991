//! Client-side synchronization layer for a single encrypted remote blob.
//!
//! Keeps a local cache of named entries consistent with a versioned remote
//! blob under at-most-one-writer contention:
//! - Codec: deterministic entry-map ↔ blob mapping
//! - Cloud cache: hydration-gated in-memory view, every mutation a
//!   conditional push cycle keyed by the server's content hash
//! - Sync engine: three-way reconcile between cloud state and the local
//!   entry store, driven by modification timestamps
//!
//! The wire transport, the encryption primitives, and the local persistent
//! store are external collaborators behind trait seams.

pub mod blob_client;
pub mod cloud_cache;
pub mod codec;
pub mod error;
pub mod sync_engine;
pub mod types;

pub use blob_client::RemoteBlobClient;
pub use cloud_cache::CloudKeyCache;
pub use error::{CloudError, CloudResult};
pub use sync_engine::SyncKeyStore;
pub use types::*;
