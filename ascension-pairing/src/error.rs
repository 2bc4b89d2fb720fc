//! Error types for pairing and capabilities.

use thiserror::Error;

/// Pairing and capability failures.
///
/// Every variant maps to one stable, machine-checkable reason string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    /// No pairing code was supplied.
    #[error("pairing code missing")]
    MissingCode,

    /// The pairing code is not the current or previous window's code.
    #[error("pairing code is stale or invalid")]
    StaleWindow,

    /// No bearer token was supplied.
    #[error("capability missing")]
    MissingCapability,

    /// The token is not three well-formed segments.
    #[error("capability token malformed")]
    Format,

    /// The token was explicitly revoked.
    #[error("capability revoked")]
    Revoked,

    /// The MAC does not verify, or the token was not minted here.
    #[error("capability signature invalid")]
    Signature,

    /// The token is past its expiry.
    #[error("capability expired")]
    Expired,

    /// The token does not grant the required scope.
    #[error("capability lacks scope {0}")]
    InsufficientScope(String),

    /// Key setup failed.
    #[error("crypto error: {0}")]
    Crypto(String),
}

impl CapabilityError {
    /// Snake_case reason, used after a `capability_` prefix.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingCode => "missing_code",
            Self::StaleWindow => "stale_window",
            Self::MissingCapability => "missing_capability",
            Self::Format => "format",
            Self::Revoked => "revoked",
            Self::Signature => "sig",
            Self::Expired => "expired",
            Self::InsufficientScope(_) => "insufficient_scope",
            Self::Crypto(_) => "crypto",
        }
    }

    /// Error taxonomy name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCode | Self::MissingCapability | Self::Format => "ParseError",
            Self::StaleWindow => "StaleWindow",
            Self::Revoked => "Revoked",
            Self::Signature => "InvalidSignature",
            Self::Expired => "Expired",
            Self::InsufficientScope(_) => "InsufficientScope",
            Self::Crypto(_) => "CryptoError",
        }
    }
}

impl From<ascension_crypto::CryptoError> for CapabilityError {
    fn from(e: ascension_crypto::CryptoError) -> Self {
        Self::Crypto(e.to_string())
    }
}

/// Result type for pairing and capability operations.
pub type CapabilityResult<T> = Result<T, CapabilityError>;
