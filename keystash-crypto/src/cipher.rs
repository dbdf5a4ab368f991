//! Blob encryption: ChaCha20-Poly1305 payload, per-recipient sealed DEKs.
//!
//! Each encrypt call generates a fresh random DEK, encrypts the payload once,
//! and seals the DEK for every recipient in the set. The detached metadata
//! document carries the payload nonce plus one envelope per recipient, so a
//! recipient-set rotation only re-seals the DEK rather than changing the
//! payload format.

use crate::envelope::{open, seal, SealedEnvelope};
use crate::error::{CryptoError, CryptoResult};
use crate::keys::RecipientSet;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Size of the payload nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of the data encryption key in bytes.
pub const KEY_SIZE: usize = 32;

/// Ciphertext plus the detached metadata needed to decrypt it.
#[derive(Clone, Debug)]
pub struct EncryptedBlob {
    /// The encrypted payload.
    pub value: Vec<u8>,
    /// Detached metadata: serialized [`BlobHeader`].
    pub meta: Vec<u8>,
}

/// Detached metadata stored alongside the ciphertext.
#[derive(Serialize, Deserialize)]
struct BlobHeader {
    /// ChaCha20-Poly1305 nonce for the payload.
    nonce: [u8; NONCE_SIZE],
    /// Sealed DEK per recipient.
    envelopes: Vec<RecipientEnvelope>,
}

#[derive(Serialize, Deserialize)]
struct RecipientEnvelope {
    /// Raw X25519 public key identifying the recipient.
    recipient: [u8; 32],
    envelope: SealedEnvelope,
}

/// Two-way encryption of an opaque blob for a recipient set.
///
/// A trait seam so the synchronization layer never depends on a concrete
/// cipher; test doubles and platform crypto providers plug in here.
pub trait BlobCipher: Send + Sync {
    /// Encrypts `plaintext` so every key in `recipients` can decrypt it.
    fn encrypt(&self, plaintext: &[u8], recipients: &RecipientSet) -> CryptoResult<EncryptedBlob>;

    /// Decrypts a blob using the owner's secret key from `recipients`.
    ///
    /// An empty value + empty metadata pair is the "no content yet" state and
    /// decrypts to an empty plaintext. Fails with [`CryptoError::Unauthorized`]
    /// when the owner is not among the recipients the blob was sealed for, and
    /// [`CryptoError::Decryption`] on tampered data.
    fn decrypt(&self, value: &[u8], meta: &[u8], recipients: &RecipientSet)
        -> CryptoResult<Vec<u8>>;
}

/// Default [`BlobCipher`] implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvelopeCipher;

impl BlobCipher for EnvelopeCipher {
    fn encrypt(&self, plaintext: &[u8], recipients: &RecipientSet) -> CryptoResult<EncryptedBlob> {
        let mut dek = Zeroizing::new([0u8; KEY_SIZE]);
        rand::rngs::OsRng.fill_bytes(&mut dek[..]);

        let mut nonce = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce);

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&dek[..]));
        let value = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| CryptoError::Encryption(format!("payload encryption failed: {e}")))?;

        let mut envelopes = Vec::with_capacity(recipients.publics().len());
        for pk in recipients.publics() {
            envelopes.push(RecipientEnvelope {
                recipient: *pk.as_bytes(),
                envelope: seal(&dek[..], pk)?,
            });
        }

        let meta = serde_json::to_vec(&BlobHeader { nonce, envelopes })?;
        Ok(EncryptedBlob { value, meta })
    }

    fn decrypt(
        &self,
        value: &[u8],
        meta: &[u8],
        recipients: &RecipientSet,
    ) -> CryptoResult<Vec<u8>> {
        // No remote content yet — nothing to decrypt.
        if value.is_empty() && meta.is_empty() {
            return Ok(Vec::new());
        }

        let header: BlobHeader = serde_json::from_slice(meta)?;

        let own_pk = recipients.secret().public_key();
        let sealed = header
            .envelopes
            .iter()
            .find(|e| e.recipient == *own_pk.as_bytes())
            .ok_or(CryptoError::Unauthorized)?;

        let dek = Zeroizing::new(open(&sealed.envelope, recipients.secret())?);

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&dek[..]));
        cipher
            .decrypt(Nonce::from_slice(&header.nonce), value)
            .map_err(|_| {
                CryptoError::Decryption("payload decryption failed (tampered data)".to_string())
            })
    }
}
