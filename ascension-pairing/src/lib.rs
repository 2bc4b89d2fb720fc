//! Device pairing and scoped capabilities for Ascension.
//!
//! This module handles:
//! - Rolling, human-typeable pairing codes derived from a local seed
//! - Exchanging a pairing code for a short-lived bearer capability
//! - Verifying capabilities per request, with scopes and expiry
//! - Process-lifetime revocation
//!
//! # Pairing Codes
//!
//! Codes are six words from a 64-word list joined by `-`
//! (e.g. `amber-nova-titan-flux-sol-rune`). A code is valid during its
//! window and the following one.
//!
//! # Capability Token Format
//!
//! `base64url(header).base64url(payload).base64url(hmac)`, HMAC-SHA256
//! over the first two encoded segments joined by `.`.

mod authority;
mod bearer;
mod capability;
mod error;
mod revocation;
mod window;
mod words;

pub use authority::{
    CapabilityAuthority, CapabilityPolicy, IssuedCapability, DEFAULT_CAPABILITY_ISSUER,
    DEFAULT_CAPABILITY_SUBJECT, DEFAULT_CAPABILITY_TTL_SECS, DEFAULT_SCOPES,
    MAX_CAPABILITY_TTL_SECS,
};
pub use bearer::parse_bearer;
pub use capability::{
    encode_token, CapabilityClaims, TokenSegments, CAPABILITY_HEADER, SCOPE_WILDCARD,
};
pub use error::{CapabilityError, CapabilityResult};
pub use revocation::RevocationSet;
pub use window::{normalize_code, PairingCodeGenerator, DEFAULT_WINDOW_SECS, DEFAULT_WORD_COUNT};
