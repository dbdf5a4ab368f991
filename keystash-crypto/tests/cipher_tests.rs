use keystash_crypto::{
    open, seal, BlobCipher, CryptoError, EnvelopeCipher, KeyPair, RecipientSet,
};

#[test]
fn keypair_generation_produces_valid_keys() {
    let kp = KeyPair::generate();
    assert_eq!(kp.public_bytes().len(), 32);
    assert_eq!(kp.secret_bytes().len(), 32);
    // Public and secret keys must differ
    assert_ne!(kp.public_bytes(), kp.secret_bytes());
}

#[test]
fn keypair_roundtrip_from_secret_bytes() {
    let kp1 = KeyPair::generate();
    let kp2 = KeyPair::from_secret_bytes(kp1.secret_bytes());
    assert_eq!(kp1.public_bytes(), kp2.public_bytes());
}

#[test]
fn seal_open_dek_roundtrip() {
    let recipient = KeyPair::generate();
    let dek = b"this-is-a-32-byte-data-encr-key!";

    let envelope = seal(dek, &recipient.public).unwrap();
    let recovered = open(&envelope, &recipient.secret).unwrap();

    assert_eq!(recovered, dek);
}

#[test]
fn open_with_wrong_key_fails() {
    let recipient = KeyPair::generate();
    let stranger = KeyPair::generate();

    let envelope = seal(b"secret", &recipient.public).unwrap();
    let result = open(&envelope, &stranger.secret);

    assert!(matches!(result, Err(CryptoError::Decryption(_))));
}

#[test]
fn encrypt_decrypt_roundtrip_self_only() {
    let owner = KeyPair::generate();
    let set = RecipientSet::self_only(owner.secret);

    let blob = EnvelopeCipher.encrypt(b"payload bytes", &set).unwrap();
    assert_ne!(blob.value, b"payload bytes");

    let plaintext = EnvelopeCipher.decrypt(&blob.value, &blob.meta, &set).unwrap();
    assert_eq!(plaintext, b"payload bytes");
}

#[test]
fn every_recipient_can_decrypt() {
    let owner = KeyPair::generate();
    let device_b = KeyPair::generate();
    let device_c = KeyPair::generate();

    let set = RecipientSet::new(
        owner.secret,
        vec![device_b.public.clone(), device_c.public.clone()],
    );
    let blob = EnvelopeCipher.encrypt(b"shared", &set).unwrap();

    for secret in [device_b.secret, device_c.secret] {
        let reader = RecipientSet::self_only(secret);
        let plaintext = EnvelopeCipher
            .decrypt(&blob.value, &blob.meta, &reader)
            .unwrap();
        assert_eq!(plaintext, b"shared");
    }
}

#[test]
fn non_recipient_is_unauthorized() {
    let owner = KeyPair::generate();
    let stranger = KeyPair::generate();

    let set = RecipientSet::self_only(owner.secret);
    let blob = EnvelopeCipher.encrypt(b"private", &set).unwrap();

    let reader = RecipientSet::self_only(stranger.secret);
    let result = EnvelopeCipher.decrypt(&blob.value, &blob.meta, &reader);

    assert!(matches!(result, Err(CryptoError::Unauthorized)));
}

#[test]
fn tampered_ciphertext_fails_decryption() {
    let owner = KeyPair::generate();
    let set = RecipientSet::self_only(owner.secret);

    let mut blob = EnvelopeCipher.encrypt(b"integrity matters", &set).unwrap();
    blob.value[0] ^= 0xFF;

    let result = EnvelopeCipher.decrypt(&blob.value, &blob.meta, &set);
    assert!(matches!(result, Err(CryptoError::Decryption(_))));
}

#[test]
fn garbled_metadata_fails_as_metadata_error() {
    let owner = KeyPair::generate();
    let set = RecipientSet::self_only(owner.secret);

    let blob = EnvelopeCipher.encrypt(b"x", &set).unwrap();
    let result = EnvelopeCipher.decrypt(&blob.value, b"not json", &set);

    assert!(matches!(result, Err(CryptoError::Metadata(_))));
}

#[test]
fn empty_value_and_meta_is_no_content_passthrough() {
    let owner = KeyPair::generate();
    let set = RecipientSet::self_only(owner.secret);

    let plaintext = EnvelopeCipher.decrypt(&[], &[], &set).unwrap();
    assert!(plaintext.is_empty());
}

#[test]
fn rotated_set_adds_new_owner_key() {
    let owner = KeyPair::generate();
    let next_owner = KeyPair::generate();
    let set = RecipientSet::self_only(owner.secret);

    let rotated = set.rotated(Some(next_owner.secret.clone()), None);
    assert_eq!(rotated.secret().to_bytes(), next_owner.secret.to_bytes());
    assert!(rotated
        .publics()
        .iter()
        .any(|p| p == &next_owner.public));
}

#[test]
fn rotated_set_keeps_current_owner_decrypting_when_only_publics_change() {
    let owner = KeyPair::generate();
    let device_b = KeyPair::generate();
    let set = RecipientSet::self_only(owner.secret);

    let rotated = set.rotated(None, Some(vec![device_b.public]));
    let blob = EnvelopeCipher.encrypt(b"still mine", &set).unwrap();

    // Rotation only changed the publics; the same secret still opens old data.
    let plaintext = EnvelopeCipher
        .decrypt(&blob.value, &blob.meta, &rotated)
        .unwrap();
    assert_eq!(plaintext, b"still mine");
}
