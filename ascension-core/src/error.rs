//! Error types for the security core.

use ascension_license::LicenseError;
use ascension_pairing::CapabilityError;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors raised while assembling a [`crate::SecurityCore`].
///
/// Per-call denials never use this type; they come back as response
/// values with a reason string.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    License(#[from] LicenseError),

    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

/// Result type for core setup.
pub type CoreResult<T> = Result<T, CoreError>;
