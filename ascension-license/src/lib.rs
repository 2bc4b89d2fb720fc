//! Licensing for Ascension.
//!
//! This module handles:
//! - Canonical encoding of license claims for signing
//! - RSA PKCS#1 v1.5 / SHA-256 verification against one embedded trust root
//! - Device fingerprinting for license binding
//! - Encrypted persistence of the accepted license
//! - Expiry, grace and tamper-lock state
//!
//! # License Key Format
//!
//! Keys are `base64(payload || 0x1E || signature)`. The payload is a
//! `;`-separated `key=value` list (see [`codec`]). Older
//! `base64(payload).base64(signature)` keys still decode.
//!
//! Everything here is offline: no network calls, no clock other than the
//! injected [`ascension_types::Clock`].

mod claims;
pub mod codec;
mod device;
mod error;
mod issuer;
mod signature;
mod store;
mod token;
mod vault;

pub use claims::{format_remaining, DeviceBinding, LicenseClaims, LicenseState, WILDCARD};
pub use device::{DeviceFingerprint, UNKNOWN_FINGERPRINT};
pub use error::{LicenseError, LicenseResult};
pub use issuer::{LicenseIssuer, ISSUER_KEY_BITS};
pub use signature::{verify, TrustedKey};
pub use store::{LicensePolicy, LicenseSnapshot, LicenseStore, DEFAULT_ISSUER};
pub use token::{sanitize_base64, LicenseToken, TokenFormat, RECORD_SEPARATOR};
pub use vault::{LicenseVault, LICENSE_FILE_NAME};
