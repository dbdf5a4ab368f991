//! Encryption adapter for Keystash.
//!
//! Provides blob encryption using a two-tier key system:
//!
//! 1. **DEK (Data Encryption Key)**: a random ChaCha20-Poly1305 key generated
//!    for each encrypt operation. Only the DEK ever touches the payload.
//! 2. **Recipient envelopes**: the DEK sealed once per recipient public key
//!    using ephemeral X25519 + XSalsa20-Poly1305 (`crypto_box`).
//!
//! This architecture allows:
//! - Rotating the recipient set without changing the payload format
//! - Sharing one blob with multiple devices/identities
//! - Detecting tampered ciphertext and unauthorized readers at decrypt time

mod cipher;
mod envelope;
mod error;
mod keys;

pub use cipher::{BlobCipher, EncryptedBlob, EnvelopeCipher, KEY_SIZE, NONCE_SIZE};
pub use envelope::{open, seal, SealedEnvelope};
pub use error::{CryptoError, CryptoResult};
pub use keys::{KeyPair, RecipientSet};

// Re-exported so callers name key types without a direct crypto_box dependency.
pub use crypto_box::{PublicKey, SecretKey};
