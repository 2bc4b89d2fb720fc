//! Security core configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty or missing
//! file yields a working configuration.
//!
//! ```toml
//! issuer = "Ascension"
//! subject = "Valkyrie"
//!
//! [pairing]
//! window_secs = 600
//! port = 8778
//!
//! [tamper]
//! interval_secs = 5
//! ```

use crate::error::ConfigError;
use ascension_license::{LicensePolicy, LicenseVault, TrustedKey, DEFAULT_ISSUER};
use ascension_pairing::{
    CapabilityPolicy, DEFAULT_CAPABILITY_SUBJECT, DEFAULT_CAPABILITY_TTL_SECS, DEFAULT_SCOPES,
    DEFAULT_WINDOW_SECS, DEFAULT_WORD_COUNT, MAX_CAPABILITY_TTL_SECS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Default config file name under the config directory.
pub const CONFIG_FILE_NAME: &str = "security.toml";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// Expected license `iss`, and the capability `iss`.
    pub issuer: String,
    /// Current bound identity (character name).
    pub subject: Option<String>,
    /// RSA public key (PEM or `<RSAKeyValue>` XML) overriding the embedded
    /// trust root.
    pub public_key: Option<String>,
    /// Where the accepted license is stored.
    pub license_path: Option<PathBuf>,
    pub pairing: PairingConfig,
    pub tamper: TamperConfig,
    /// Expiry recheck cadence.
    pub status_interval_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            issuer: DEFAULT_ISSUER.to_string(),
            subject: None,
            public_key: None,
            license_path: None,
            pairing: PairingConfig::default(),
            tamper: TamperConfig::default(),
            status_interval_secs: 300,
        }
    }
}

/// Pairing and capability settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PairingConfig {
    pub window_secs: u64,
    pub word_count: usize,
    /// Advertised in pairing info; nothing here listens on it.
    pub host: String,
    pub port: u16,
    pub default_scopes: Vec<String>,
    pub capability_ttl_secs: u64,
    pub max_capability_ttl_secs: u64,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW_SECS,
            word_count: DEFAULT_WORD_COUNT,
            host: "127.0.0.1".to_string(),
            port: 8778,
            default_scopes: DEFAULT_SCOPES.iter().map(|s| (*s).to_string()).collect(),
            capability_ttl_secs: DEFAULT_CAPABILITY_TTL_SECS,
            max_capability_ttl_secs: MAX_CAPABILITY_TTL_SECS,
        }
    }
}

/// Self-integrity check settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TamperConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    /// File to watch; the running executable when unset.
    pub binary_path: Option<PathBuf>,
}

impl Default for TamperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 5,
            binary_path: None,
        }
    }
}

impl SecurityConfig {
    /// `<config dir>/Ascension/security.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("Ascension").join(CONFIG_FILE_NAME))
    }

    /// Loads and validates a config file. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed or
    /// validated.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        info!(path = %path.display(), "Loaded security config");
        Ok(config)
    }

    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Parse` or `Invalid`.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks ranges and the public key.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.issuer.trim().is_empty() {
            return invalid("issuer must not be empty");
        }
        if self.pairing.window_secs == 0 {
            return invalid("pairing.window_secs must be positive");
        }
        if !(1..=16).contains(&self.pairing.word_count) {
            return invalid("pairing.word_count must be between 1 and 16");
        }
        if self.pairing.default_scopes.iter().all(|s| s.trim().is_empty()) {
            return invalid("pairing.default_scopes must name at least one scope");
        }
        if self.pairing.capability_ttl_secs == 0
            || self.pairing.capability_ttl_secs > self.pairing.max_capability_ttl_secs
        {
            return invalid("pairing.capability_ttl_secs must be between 1 and max_capability_ttl_secs");
        }
        if self.tamper.interval_secs == 0 {
            return invalid("tamper.interval_secs must be positive");
        }
        if self.status_interval_secs == 0 {
            return invalid("status_interval_secs must be positive");
        }
        if let Some(key) = &self.public_key {
            TrustedKey::parse(key).map_err(|_| {
                ConfigError::Invalid("public_key is not a valid RSA public key".into())
            })?;
        }
        Ok(())
    }

    /// The configured trust root, or the embedded one.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if the configured key does not parse.
    pub fn trusted_key(&self) -> Result<TrustedKey, ConfigError> {
        match &self.public_key {
            Some(text) => TrustedKey::parse(text),
            None => TrustedKey::embedded(),
        }
        .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Configured license path, or the platform default.
    #[must_use]
    pub fn resolved_license_path(&self) -> Option<PathBuf> {
        self.license_path.clone().or_else(LicenseVault::default_path)
    }

    #[must_use]
    pub fn license_policy(&self) -> LicensePolicy {
        LicensePolicy {
            issuer: self.issuer.clone(),
            subject: self.subject.clone(),
        }
    }

    #[must_use]
    pub fn capability_policy(&self) -> CapabilityPolicy {
        CapabilityPolicy {
            issuer: self.issuer.clone(),
            subject: DEFAULT_CAPABILITY_SUBJECT.to_string(),
            default_scopes: self
                .pairing
                .default_scopes
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            default_ttl_secs: self.pairing.capability_ttl_secs,
            max_ttl_secs: self.pairing.max_capability_ttl_secs,
        }
    }
}
