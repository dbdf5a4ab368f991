//! Per-recipient DEK sealing.
//!
//! Uses ephemeral X25519 key exchange + XSalsa20-Poly1305 to encrypt a blob's
//! data encryption key for one recipient. The ephemeral public key travels
//! with the ciphertext so the recipient can reconstruct the shared secret;
//! the sender's identity is not revealed.

use crate::error::{CryptoError, CryptoResult};
use crypto_box::aead::Aead;
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// A DEK sealed with one recipient's X25519 public key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SealedEnvelope {
    /// Ephemeral X25519 public key (sender side of DH).
    pub ephemeral_public_key: [u8; 32],
    /// XSalsa20 nonce (24 bytes).
    pub nonce: [u8; 24],
    /// Encrypted DEK (XSalsa20-Poly1305 ciphertext + Poly1305 tag).
    pub ciphertext: Vec<u8>,
}

/// Seals a DEK for a recipient. A fresh ephemeral keypair is generated per
/// seal operation.
pub fn seal(dek: &[u8], recipient_pk: &PublicKey) -> CryptoResult<SealedEnvelope> {
    let ephemeral = SecretKey::generate(&mut rand::rngs::OsRng);
    let ephemeral_pk = ephemeral.public_key();

    let salsa_box = SalsaBox::new(recipient_pk, &ephemeral);

    let mut nonce_bytes = [0u8; 24];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

    let ciphertext = salsa_box
        .encrypt(crypto_box::Nonce::from_slice(&nonce_bytes), dek)
        .map_err(|e| CryptoError::Encryption(format!("envelope seal failed: {e}")))?;

    Ok(SealedEnvelope {
        ephemeral_public_key: *ephemeral_pk.as_bytes(),
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Opens a sealed DEK with the recipient's secret key.
pub fn open(envelope: &SealedEnvelope, recipient_sk: &SecretKey) -> CryptoResult<Vec<u8>> {
    let ephemeral_pk = PublicKey::from(envelope.ephemeral_public_key);
    let salsa_box = SalsaBox::new(&ephemeral_pk, recipient_sk);

    salsa_box
        .decrypt(
            crypto_box::Nonce::from_slice(&envelope.nonce),
            envelope.ciphertext.as_ref(),
        )
        .map_err(|_| {
            CryptoError::Decryption("envelope open failed (wrong key or tampered data)".to_string())
        })
}
