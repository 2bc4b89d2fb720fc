//! Capability claims and the three-segment token codec.
//!
//! `base64url(header) "." base64url(payload) "." base64url(mac)` with
//! `mac = HMAC-SHA256(secret, header "." payload)` over the encoded
//! segments. All segments are unpadded base64url.

use crate::error::{CapabilityError, CapabilityResult};
use ascension_crypto::MacKey;
use ascension_types::Nonce;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The only header this authority mints or accepts.
pub const CAPABILITY_HEADER: &str = r#"{"alg":"HS256","typ":"CAP"}"#;

/// Scope wildcard.
pub const SCOPE_WILDCARD: &str = "*";

/// Claims carried by a capability token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityClaims {
    /// Logical caller, e.g. `module`.
    pub sub: String,
    /// Minting authority.
    pub iss: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub iat: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub exp: DateTime<Utc>,
    pub scopes: BTreeSet<String>,
    /// Unique per issuance.
    pub nonce: Nonce,
}

impl CapabilityClaims {
    /// Returns true if `scope` is granted.
    #[must_use]
    pub fn allows(&self, scope: &str) -> bool {
        self.scopes.contains(SCOPE_WILDCARD) || self.scopes.contains(scope)
    }

    /// Expired once `now` reaches `exp`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.exp
    }
}

/// Signs `claims` into a wire token.
///
/// # Errors
///
/// Returns `Format` if the claims do not serialize.
pub fn encode_token(key: &MacKey, claims: &CapabilityClaims) -> CapabilityResult<String> {
    let header = URL_SAFE_NO_PAD.encode(CAPABILITY_HEADER);
    let payload_json = serde_json::to_vec(claims).map_err(|_| CapabilityError::Format)?;
    let payload = URL_SAFE_NO_PAD.encode(payload_json);
    let mac = key.compute(signing_input(&header, &payload).as_bytes());
    Ok(format!("{header}.{payload}.{}", URL_SAFE_NO_PAD.encode(mac)))
}

/// The three segments of a token, not yet verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSegments<'a> {
    pub header: &'a str,
    pub payload: &'a str,
    pub mac: &'a str,
}

impl<'a> TokenSegments<'a> {
    /// Splits a token into exactly three non-empty segments.
    ///
    /// # Errors
    ///
    /// Returns `Format` otherwise.
    pub fn split(token: &'a str) -> CapabilityResult<Self> {
        let mut parts = token.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(header), Some(payload), Some(mac), None)
                if !header.is_empty() && !payload.is_empty() && !mac.is_empty() =>
            {
                Ok(Self {
                    header,
                    payload,
                    mac,
                })
            }
            _ => Err(CapabilityError::Format),
        }
    }

    /// Checks the MAC in constant time. A segment that is not base64url
    /// simply fails.
    #[must_use]
    pub fn verify_mac(&self, key: &MacKey) -> bool {
        let Ok(tag) = URL_SAFE_NO_PAD.decode(self.mac) else {
            return false;
        };
        key.verify(signing_input(self.header, self.payload).as_bytes(), &tag)
    }

    /// Decodes header and payload. Call only after [`Self::verify_mac`].
    ///
    /// # Errors
    ///
    /// Returns `Format` for an unknown header or an undecodable payload.
    pub fn decode_claims(&self) -> CapabilityResult<CapabilityClaims> {
        let header = URL_SAFE_NO_PAD
            .decode(self.header)
            .map_err(|_| CapabilityError::Format)?;
        if header != CAPABILITY_HEADER.as_bytes() {
            return Err(CapabilityError::Format);
        }
        let payload = URL_SAFE_NO_PAD
            .decode(self.payload)
            .map_err(|_| CapabilityError::Format)?;
        serde_json::from_slice(&payload).map_err(|_| CapabilityError::Format)
    }
}

fn signing_input(header: &str, payload: &str) -> String {
    format!("{header}.{payload}")
}
