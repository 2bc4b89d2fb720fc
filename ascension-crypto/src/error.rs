//! Error types for the crypto layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Sealing failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Opening failed (wrong key or tampered data).
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Reading input for a digest failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
