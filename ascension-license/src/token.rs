//! License token wire forms.
//!
//! Canonical form: `base64(payload || 0x1E || signature)`.
//!
//! Legacy form: `base64(payload).base64(signature)` with a
//! `subject|expiry[|features]` payload. It is decoded for old keys only;
//! the issuer never produces it.
//!
//! Pasted text is sanitized first: URL-safe characters map to the
//! standard alphabet, anything outside the alphabet (spaces, line breaks
//! from chunked chat pastes) is dropped, and padding is restored.

use crate::claims::{DeviceBinding, LicenseClaims, WILDCARD};
use crate::codec;
use crate::error::{LicenseError, LicenseResult};
use crate::signature::TrustedKey;
use ascension_types::Nonce;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::NaiveDate;

/// Delimiter between payload and signature (ASCII Record Separator).
pub const RECORD_SEPARATOR: u8 = 0x1E;

/// Which wire form a token arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenFormat {
    Canonical,
    Legacy,
}

/// A decoded, not yet verified license token.
#[derive(Clone, PartialEq, Eq)]
pub struct LicenseToken {
    format: TokenFormat,
    payload: Vec<u8>,
    signature: Vec<u8>,
}

impl std::fmt::Debug for LicenseToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseToken")
            .field("format", &self.format)
            .field("payload_len", &self.payload.len())
            .field("signature", &"[REDACTED]")
            .finish()
    }
}

impl LicenseToken {
    /// Builds a canonical token from payload and signature bytes.
    #[must_use]
    pub fn canonical(payload: Vec<u8>, signature: Vec<u8>) -> Self {
        Self {
            format: TokenFormat::Canonical,
            payload,
            signature,
        }
    }

    /// Parses pasted or transmitted license text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyFormat` for empty input, bad base64, or a blob
    /// without a payload before the separator. A legacy token whose
    /// signature segment is not base64 is `InvalidSignature`.
    pub fn parse(wire: &str) -> LicenseResult<Self> {
        let wire = wire.trim();
        if wire.is_empty() {
            return Err(LicenseError::InvalidKeyFormat("empty license".into()));
        }

        if wire.contains('.') {
            return Self::parse_legacy(wire);
        }

        let blob = decode_base64(wire)
            .ok_or_else(|| LicenseError::InvalidKeyFormat("license is not base64".into()))?;
        Self::from_blob(&blob)
    }

    /// Splits a raw decoded blob at the first record separator.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyFormat` if the separator is missing or leading.
    pub fn from_blob(blob: &[u8]) -> LicenseResult<Self> {
        match blob.iter().position(|b| *b == RECORD_SEPARATOR) {
            Some(pos) if pos > 0 => Ok(Self::canonical(
                blob[..pos].to_vec(),
                blob[pos + 1..].to_vec(),
            )),
            _ => Err(LicenseError::InvalidKeyFormat(
                "missing payload separator".into(),
            )),
        }
    }

    /// Restores a token from the bytes written by [`Self::persisted_bytes`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::parse`].
    pub fn from_persisted(bytes: &[u8]) -> LicenseResult<Self> {
        if bytes.contains(&RECORD_SEPARATOR) {
            return Self::from_blob(bytes);
        }
        let text = std::str::from_utf8(bytes)
            .map_err(|_| LicenseError::InvalidKeyFormat("stored license is unreadable".into()))?;
        Self::parse(text)
    }

    fn parse_legacy(wire: &str) -> LicenseResult<Self> {
        let mut parts = wire.split('.');
        let (Some(payload), Some(signature), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(LicenseError::InvalidKeyFormat(
                "expected two dot-separated segments".into(),
            ));
        };
        let payload = decode_base64(payload)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| LicenseError::InvalidKeyFormat("payload is not base64".into()))?;
        let signature = decode_base64(signature).ok_or(LicenseError::InvalidSignature)?;
        Ok(Self {
            format: TokenFormat::Legacy,
            payload,
            signature,
        })
    }

    #[must_use]
    pub fn format(&self) -> TokenFormat {
        self.format
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Checks the signature against `key`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSignature` on any verification failure.
    pub fn verify(&self, key: &TrustedKey) -> LicenseResult<()> {
        if key.verify(&self.payload, &self.signature) {
            Ok(())
        } else {
            Err(LicenseError::InvalidSignature)
        }
    }

    /// Decodes the claims. Only meaningful after [`Self::verify`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` if the payload does not decode.
    pub fn claims(&self) -> LicenseResult<LicenseClaims> {
        match self.format {
            TokenFormat::Canonical => codec::decode(&self.payload),
            TokenFormat::Legacy => decode_legacy_payload(&self.payload),
        }
    }

    /// Encodes the token back into its wire text.
    #[must_use]
    pub fn to_wire(&self) -> String {
        match self.format {
            TokenFormat::Canonical => STANDARD.encode(self.to_blob()),
            TokenFormat::Legacy => format!(
                "{}.{}",
                STANDARD.encode(&self.payload),
                STANDARD.encode(&self.signature)
            ),
        }
    }

    /// `payload || 0x1E || signature`.
    #[must_use]
    pub fn to_blob(&self) -> Vec<u8> {
        let mut blob = Vec::with_capacity(self.payload.len() + 1 + self.signature.len());
        blob.extend_from_slice(&self.payload);
        blob.push(RECORD_SEPARATOR);
        blob.extend_from_slice(&self.signature);
        blob
    }

    /// Bytes to persist: the raw blob, or the wire text for legacy tokens.
    #[must_use]
    pub fn persisted_bytes(&self) -> Vec<u8> {
        match self.format {
            TokenFormat::Canonical => self.to_blob(),
            TokenFormat::Legacy => self.to_wire().into_bytes(),
        }
    }
}

/// Normalizes pasted base64 text to the padded standard alphabet.
#[must_use]
pub fn sanitize_base64(text: &str) -> String {
    let mut out: String = text
        .chars()
        .filter_map(|c| match c {
            '-' => Some('+'),
            '_' => Some('/'),
            'A'..='Z' | 'a'..='z' | '0'..='9' | '+' | '/' => Some(c),
            _ => None,
        })
        .collect();
    while out.len() % 4 != 0 {
        out.push('=');
    }
    out
}

fn decode_base64(text: &str) -> Option<Vec<u8>> {
    STANDARD.decode(sanitize_base64(text)).ok()
}

/// `subject|expiry[|features]`; expiry is RFC 3339 or a bare date, in
/// which case the license runs through the end of that day.
fn decode_legacy_payload(bytes: &[u8]) -> LicenseResult<LicenseClaims> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| LicenseError::InvalidPayload("payload is not UTF-8".into()))?;
    let tokens: Vec<&str> = text.split('|').collect();
    if tokens.len() < 2 {
        return Err(LicenseError::InvalidPayload(
            "legacy payload needs subject and expiry".into(),
        ));
    }

    let expiry = tokens[1].trim();
    let expires_at = match NaiveDate::parse_from_str(expiry, "%Y-%m-%d") {
        Ok(date) => date
            .and_hms_opt(23, 59, 59)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| LicenseError::InvalidPayload("invalid expiry date".into()))?,
        Err(_) => codec::parse_timestamp(expiry)?,
    };

    let mut features = tokens
        .get(2)
        .map(|raw| codec::parse_features(raw))
        .unwrap_or_default();
    if features.is_empty() {
        features.insert(WILDCARD.to_string());
    }

    let subject = tokens[0].trim();
    Ok(LicenseClaims {
        subject: (!subject.is_empty()).then(|| subject.to_string()),
        expires_at,
        grace_seconds: 0,
        features,
        device: DeviceBinding::Unbound,
        nonce: Nonce::from_raw(""),
        issuer: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_maps_url_safe_and_repads() {
        assert_eq!(sanitize_base64("ab-_\n cd"), "ab+/cd==");
        assert_eq!(sanitize_base64("abcd"), "abcd");
    }

    #[test]
    fn blob_without_payload_is_format_error() {
        let err = LicenseToken::from_blob(&[RECORD_SEPARATOR, 1, 2]).unwrap_err();
        assert_eq!(err.reason(), "ParseError");
        assert!(LicenseToken::from_blob(b"no separator").is_err());
    }

    #[test]
    fn legacy_bare_date_runs_to_end_of_day() {
        let claims = decode_legacy_payload(b"Zed|2031-05-06").unwrap();
        assert_eq!(claims.expires_at.to_rfc3339(), "2031-05-06T23:59:59+00:00");
        assert!(claims.allows("macro.run"));
        assert_eq!(claims.subject.as_deref(), Some("Zed"));
    }
}
