//! Symmetric cryptography for the Ascension security core.
//!
//! - HMAC-SHA256 and constant-time comparison (`mac`)
//! - SHA-256 digests of files on disk (`digest`)
//! - ChaCha20-Poly1305 sealing of small blobs (`cipher`)
//! - Argon2id key derivation and random secrets (`key`)
//! - The `DataEncryptor` seam used for at-rest protection (`encryptor`)
//!
//! Asymmetric license signatures live in `ascension-license`; this crate
//! only holds primitives keyed by local secrets.

mod cipher;
mod digest;
mod encryptor;
mod error;
mod key;
mod mac;

pub use cipher::{open, seal, SealedBlob, NONCE_SIZE, TAG_SIZE};
pub use digest::{sha256, sha256_file, Digest256, DIGEST_SIZE};
pub use encryptor::{
    DataEncryptor, EncryptorError, EncryptorResult, PassthroughEncryptor, UserScopedEncryptor,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    derive_key, generate_random_key, DerivedKey, KdfParams, Salt, SecretKey, KEY_SIZE, SALT_SIZE,
};
pub use mac::{constant_time_eq, hmac_sha256, verify_hmac_sha256, MacKey, MAC_SIZE};
