//! Key material for blob encryption.

use crypto_box::{PublicKey, SecretKey};

/// X25519 keypair identifying one owner of a remote blob.
///
/// The secret key implements `ZeroizeOnDrop` automatically (from crypto_box).
pub struct KeyPair {
    pub secret: SecretKey,
    pub public: PublicKey,
}

impl KeyPair {
    /// Generates a fresh keypair.
    pub fn generate() -> Self {
        let secret = SecretKey::generate(&mut rand::rngs::OsRng);
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Reconstructs a keypair from raw secret key bytes.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        let secret = SecretKey::from(bytes);
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Returns the public key as a raw 32-byte array.
    pub fn public_bytes(&self) -> [u8; 32] {
        *self.public.as_bytes()
    }

    /// Returns the secret key as a raw 32-byte array.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }
}

/// The identity a blob is protected for: the owner's secret key plus every
/// public key that must be able to decrypt it.
///
/// The owner's own public key is always part of the set, so
/// `RecipientSet::new(secret, vec![])` means "self only". This replaces
/// optional-identity parameters on every cache operation with one explicit
/// value passed at construction and rotated atomically.
#[derive(Clone)]
pub struct RecipientSet {
    secret: SecretKey,
    publics: Vec<PublicKey>,
}

impl RecipientSet {
    /// Builds a recipient set from the owner's secret key and additional
    /// recipient public keys. The owner's own public key is added if absent.
    pub fn new(secret: SecretKey, publics: Vec<PublicKey>) -> Self {
        let own = secret.public_key();
        let mut publics = publics;
        if !publics.iter().any(|p| p == &own) {
            publics.push(own);
        }
        Self { secret, publics }
    }

    /// A recipient set containing only the owner.
    pub fn self_only(secret: SecretKey) -> Self {
        Self::new(secret, Vec::new())
    }

    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }

    pub fn publics(&self) -> &[PublicKey] {
        &self.publics
    }

    /// Returns a copy of this set with the given components replaced.
    ///
    /// Passing `None` keeps the current component. When only the secret key
    /// changes, the new owner public key joins the recipient list; when only
    /// the public keys change, the current owner stays able to decrypt.
    pub fn rotated(
        &self,
        new_secret: Option<SecretKey>,
        new_publics: Option<Vec<PublicKey>>,
    ) -> Self {
        let secret = new_secret.unwrap_or_else(|| self.secret.clone());
        let publics = new_publics.unwrap_or_else(|| self.publics.clone());
        Self::new(secret, publics)
    }
}
