use ascension_crypto::{
    derive_key, generate_random_key, open, seal, KdfParams, Salt, SealedBlob, NONCE_SIZE, TAG_SIZE,
};

#[test]
fn seal_open_roundtrip() {
    let key = generate_random_key();
    let sealed = seal(&key, b"license blob", b"license").unwrap();
    let opened = open(&key, &sealed, b"license").unwrap();
    assert_eq!(opened, b"license blob");
}

#[test]
fn seal_open_empty() {
    let key = generate_random_key();
    let sealed = seal(&key, b"", b"").unwrap();
    assert_eq!(sealed.ciphertext.len(), TAG_SIZE);
    assert_eq!(open(&key, &sealed, b"").unwrap(), b"");
}

#[test]
fn wrong_key_fails() {
    let sealed = seal(&generate_random_key(), b"secret", b"").unwrap();
    assert!(open(&generate_random_key(), &sealed, b"").is_err());
}

#[test]
fn wrong_aad_fails() {
    let key = generate_random_key();
    let sealed = seal(&key, b"secret", b"slot-a").unwrap();
    assert!(open(&key, &sealed, b"slot-b").is_err());
}

#[test]
fn tampered_ciphertext_fails() {
    let key = generate_random_key();
    let mut sealed = seal(&key, b"secret", b"").unwrap();
    sealed.ciphertext[0] ^= 0xFF;
    assert!(open(&key, &sealed, b"").is_err());
}

#[test]
fn nonces_are_fresh() {
    let key = generate_random_key();
    let a = seal(&key, b"same", b"").unwrap();
    let b = seal(&key, b"same", b"").unwrap();
    assert_ne!(a.nonce, b.nonce);
    assert_ne!(a.ciphertext, b.ciphertext);
}

// ── SealedBlob ───────────────────────────────────────────────────

#[test]
fn flat_bytes_roundtrip() {
    let key = generate_random_key();
    let sealed = seal(&key, b"payload", b"").unwrap();
    let bytes = sealed.to_bytes();
    assert_eq!(bytes.len(), NONCE_SIZE + 7 + TAG_SIZE);
    let parsed = SealedBlob::from_bytes(&bytes).unwrap();
    assert_eq!(parsed, sealed);
}

#[test]
fn flat_bytes_too_short() {
    assert!(SealedBlob::from_bytes(&[0u8; NONCE_SIZE + TAG_SIZE - 1]).is_err());
}

// ── KDF ──────────────────────────────────────────────────────────

#[test]
fn derivation_is_deterministic() {
    let salt = Salt::from_bytes([7u8; 16]);
    let a = derive_key(b"machine|user", &salt, &KdfParams::fast()).unwrap();
    let b = derive_key(b"machine|user", &salt, &KdfParams::fast()).unwrap();
    assert_eq!(a.as_bytes(), b.as_bytes());
}

#[test]
fn derivation_depends_on_input_and_salt() {
    let salt = Salt::from_bytes([7u8; 16]);
    let a = derive_key(b"machine|user", &salt, &KdfParams::fast()).unwrap();
    let b = derive_key(b"machine|other", &salt, &KdfParams::fast()).unwrap();
    let c = derive_key(b"machine|user", &Salt::from_bytes([8u8; 16]), &KdfParams::fast()).unwrap();
    assert_ne!(a.as_bytes(), b.as_bytes());
    assert_ne!(a.as_bytes(), c.as_bytes());
}

#[test]
fn key_debug_is_redacted() {
    let key = generate_random_key();
    let dbg = format!("{key:?}");
    assert!(dbg.contains("REDACTED"));
}
