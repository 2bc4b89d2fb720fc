//! Abstract at-rest protection for persisted blobs.
//!
//! The license vault depends on `Arc<dyn DataEncryptor>` and never sees
//! raw keys. `UserScopedEncryptor` keys the cipher to the current machine
//! and user, so a copied file does not open under another account;
//! `PassthroughEncryptor` stores bytes unchanged for tests.

use crate::cipher::{self, SealedBlob};
use crate::digest::sha256;
use crate::key::{derive_key, DerivedKey, KdfParams, Salt, SALT_SIZE};
use thiserror::Error;

/// Errors from the encryption layer.
#[derive(Debug, Error)]
pub enum EncryptorError {
    /// No key is available.
    #[error("encryptor unavailable")]
    Unavailable,
    /// Underlying crypto failure.
    #[error("crypto error: {0}")]
    Crypto(String),
}

pub type EncryptorResult<T> = Result<T, EncryptorError>;

/// Trait for protecting opaque byte slices at rest.
///
/// Implementations own the key material. Callers never see raw keys.
pub trait DataEncryptor: Send + Sync {
    /// Encrypts `data` under `label`, returning an opaque blob.
    fn encrypt_bytes(&self, label: &str, data: &[u8]) -> EncryptorResult<Vec<u8>>;

    /// Decrypts a blob previously produced by `encrypt_bytes` with the
    /// same label.
    fn decrypt_bytes(&self, label: &str, data: &[u8]) -> EncryptorResult<Vec<u8>>;

    /// Whether the encryptor has key material.
    fn is_available(&self) -> bool;
}

/// No-op encryptor for tests. Data passes through unchanged.
pub struct PassthroughEncryptor;

impl DataEncryptor for PassthroughEncryptor {
    fn encrypt_bytes(&self, _label: &str, data: &[u8]) -> EncryptorResult<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decrypt_bytes(&self, _label: &str, data: &[u8]) -> EncryptorResult<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Domain separator for the user-scoped key salt.
const USER_SCOPE_DOMAIN: &[u8] = b"ascension.at-rest.v1";

/// Encryptor keyed to a durable per-user identity.
///
/// The key is stretched with Argon2id from the caller-supplied scope
/// material (machine id and user name); the blob label is bound as AEAD
/// associated data so blobs cannot be swapped between slots.
pub struct UserScopedEncryptor {
    key: DerivedKey,
}

impl UserScopedEncryptor {
    /// Derives the key for `scope_material` with default KDF parameters.
    pub fn new(scope_material: &str) -> EncryptorResult<Self> {
        Self::with_params(scope_material, &KdfParams::default())
    }

    /// Derives the key with explicit KDF parameters.
    pub fn with_params(scope_material: &str, params: &KdfParams) -> EncryptorResult<Self> {
        let digest = sha256(USER_SCOPE_DOMAIN);
        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&digest[..SALT_SIZE]);

        let key = derive_key(scope_material.as_bytes(), &Salt::from_bytes(salt), params)
            .map_err(|e| EncryptorError::Crypto(e.to_string()))?;
        Ok(Self { key })
    }
}

impl DataEncryptor for UserScopedEncryptor {
    fn encrypt_bytes(&self, label: &str, data: &[u8]) -> EncryptorResult<Vec<u8>> {
        let sealed = cipher::seal(&self.key, data, label.as_bytes())
            .map_err(|e| EncryptorError::Crypto(e.to_string()))?;
        Ok(sealed.to_bytes())
    }

    fn decrypt_bytes(&self, label: &str, data: &[u8]) -> EncryptorResult<Vec<u8>> {
        let sealed =
            SealedBlob::from_bytes(data).map_err(|e| EncryptorError::Crypto(e.to_string()))?;
        cipher::open(&self.key, &sealed, label.as_bytes())
            .map_err(|e| EncryptorError::Crypto(e.to_string()))
    }

    fn is_available(&self) -> bool {
        true
    }
}
