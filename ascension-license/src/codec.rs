//! Canonical payload encoding for license claims.
//!
//! The payload is a `;`-separated list of `key=value` pairs in a fixed
//! order:
//!
//! ```text
//! ver=1;char=<subject>;exp=<RFC 3339 UTC>;nonce=<n>;features=<a,b>;grace=<secs>;device=<fp|*>[;iss=<issuer>]
//! ```
//!
//! Encoding is deterministic: the same claims always produce the same
//! bytes. Values that contain a separator or a control character are
//! rejected rather than escaped, so no value can smuggle in a second
//! field. Feature names and device bindings also reject whitespace, so
//! every encodable record decodes back to itself. Decoding is strict:
//! unknown keys, duplicate keys, a missing `ver` or `exp`, and
//! unparsable values all fail as a whole.

use crate::claims::{DeviceBinding, LicenseClaims, WILDCARD};
use crate::error::{LicenseError, LicenseResult};
use ascension_types::Nonce;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeSet;

/// Payload format version.
pub const PAYLOAD_VERSION: &str = "1";

const FIELD_SEPARATOR: char = ';';
const KEY_VALUE_SEPARATOR: char = '=';
const LIST_SEPARATOR: char = ',';

/// Encodes claims into canonical payload bytes.
///
/// # Errors
///
/// Returns `InvalidPayload` if any value contains `;`, `=`, `,` or a
/// control character, if a feature name is empty or contains whitespace,
/// or if a device binding would read back as a different binding.
pub fn encode(claims: &LicenseClaims) -> LicenseResult<Vec<u8>> {
    let subject = claims.subject.as_deref().unwrap_or("");
    check_value("char", subject)?;
    check_value("nonce", claims.nonce.as_str())?;
    for feature in &claims.features {
        check_token("features", feature)?;
    }
    if let DeviceBinding::Bound(id) = &claims.device {
        check_token("device", id)?;
        if id == WILDCARD {
            return Err(LicenseError::InvalidPayload(
                "bound device cannot be the wildcard".into(),
            ));
        }
    }
    let device = claims.device.as_wire();

    let features = claims
        .features
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",");

    let mut out = format!(
        "ver={PAYLOAD_VERSION};char={subject};exp={exp};nonce={nonce};features={features};grace={grace};device={device}",
        exp = claims.expires_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        nonce = claims.nonce,
        grace = claims.grace_seconds,
    );

    if let Some(issuer) = &claims.issuer {
        check_value("iss", issuer)?;
        out.push_str(";iss=");
        out.push_str(issuer);
    }

    Ok(out.into_bytes())
}

/// Decodes canonical payload bytes into claims.
///
/// Accepts `tick` as an older spelling of `nonce`.
///
/// # Errors
///
/// Returns `InvalidPayload` on any structural or value error.
pub fn decode(bytes: &[u8]) -> LicenseResult<LicenseClaims> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| LicenseError::InvalidPayload("payload is not UTF-8".into()))?;

    let mut fields = RawFields::default();
    for pair in text.split(FIELD_SEPARATOR) {
        let (key, value) = pair
            .split_once(KEY_VALUE_SEPARATOR)
            .ok_or_else(|| LicenseError::InvalidPayload("field without '='".into()))?;
        fields.insert(key, value)?;
    }

    let version = fields
        .ver
        .ok_or_else(|| LicenseError::InvalidPayload("missing ver".into()))?;
    if version != PAYLOAD_VERSION {
        return Err(LicenseError::InvalidPayload(format!(
            "unsupported version {version}"
        )));
    }

    let expires_at = fields
        .exp
        .ok_or_else(|| LicenseError::InvalidPayload("missing exp".into()))
        .and_then(parse_timestamp)?;

    let grace_seconds = match fields.grace {
        Some(raw) if !raw.is_empty() => raw
            .parse::<u64>()
            .map_err(|_| LicenseError::InvalidPayload("grace is not a number".into()))?,
        _ => 0,
    };

    Ok(LicenseClaims {
        subject: fields.char.filter(|s| !s.is_empty()).map(str::to_string),
        expires_at,
        grace_seconds,
        features: decode_features(fields.features.unwrap_or(""))?,
        device: DeviceBinding::from_wire(fields.device.unwrap_or("")),
        nonce: Nonce::from_raw(fields.nonce.unwrap_or("")),
        issuer: fields.iss.filter(|s| !s.is_empty()).map(str::to_string),
    })
}

/// Splits a loosely typed feature list on `,` or whitespace into a set.
///
/// Only for legacy payloads and operator input; canonical payloads go
/// through the strict `,`-only split.
#[must_use]
pub fn parse_features(raw: &str) -> BTreeSet<String> {
    raw.split(|c: char| c == LIST_SEPARATOR || c.is_whitespace())
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses an RFC 3339 timestamp into UTC.
pub(crate) fn parse_timestamp(raw: &str) -> LicenseResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| LicenseError::InvalidPayload("exp is not an RFC 3339 timestamp".into()))
}

fn decode_features(raw: &str) -> LicenseResult<BTreeSet<String>> {
    if raw.is_empty() {
        return Ok(BTreeSet::new());
    }
    raw.split(LIST_SEPARATOR)
        .map(|feature| {
            check_token("features", feature)?;
            Ok(feature.to_string())
        })
        .collect()
}

/// A single list item or binding: non-empty, no whitespace.
fn check_token(field: &str, value: &str) -> LicenseResult<()> {
    if value.is_empty() {
        return Err(LicenseError::InvalidPayload(format!("empty {field} value")));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(LicenseError::InvalidPayload(format!(
            "{field} contains whitespace"
        )));
    }
    check_value(field, value)
}

fn check_value(field: &str, value: &str) -> LicenseResult<()> {
    let forbidden = value.chars().any(|c| {
        c == FIELD_SEPARATOR || c == KEY_VALUE_SEPARATOR || c == LIST_SEPARATOR || c.is_control()
    });
    if forbidden {
        return Err(LicenseError::InvalidPayload(format!(
            "{field} contains a reserved character"
        )));
    }
    Ok(())
}

#[derive(Default)]
struct RawFields<'a> {
    ver: Option<&'a str>,
    char: Option<&'a str>,
    exp: Option<&'a str>,
    nonce: Option<&'a str>,
    features: Option<&'a str>,
    grace: Option<&'a str>,
    device: Option<&'a str>,
    iss: Option<&'a str>,
}

impl<'a> RawFields<'a> {
    fn insert(&mut self, key: &str, value: &'a str) -> LicenseResult<()> {
        let slot = match key {
            "ver" => &mut self.ver,
            "char" => &mut self.char,
            "exp" => &mut self.exp,
            "nonce" | "tick" => &mut self.nonce,
            "features" => &mut self.features,
            "grace" => &mut self.grace,
            "device" => &mut self.device,
            "iss" => &mut self.iss,
            _ => {
                return Err(LicenseError::InvalidPayload(format!("unknown field {key}")));
            }
        };
        if slot.replace(value).is_some() {
            return Err(LicenseError::InvalidPayload(format!("duplicate field {key}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn encodes_fields_in_fixed_order() {
        let claims = LicenseClaims::new(Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap())
            .with_subject("Zed")
            .with_nonce(Nonce::from_raw("abc"))
            .with_features(["macro.run", "hud.read"])
            .with_grace_seconds(60);
        let bytes = encode(&claims).unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            "ver=1;char=Zed;exp=2030-01-02T03:04:05Z;nonce=abc;features=hud.read,macro.run;grace=60;device=*"
        );
    }

    #[test]
    fn tick_is_accepted_as_nonce() {
        let claims =
            decode(b"ver=1;char=;exp=2030-01-01T00:00:00Z;tick=00ff;features=*").unwrap();
        assert_eq!(claims.nonce.as_str(), "00ff");
        assert!(claims.allows("anything"));
    }

    #[test]
    fn feature_with_whitespace_never_encodes() {
        let claims = LicenseClaims::new(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())
            .with_features(["macro run"]);
        assert!(encode(&claims).is_err());
    }

    #[test]
    fn canonical_features_split_on_comma_only() {
        let claims =
            decode(b"ver=1;exp=2030-01-01T00:00:00Z;features=hud.read,macro.run").unwrap();
        assert_eq!(claims.features.len(), 2);
        assert!(decode(b"ver=1;exp=2030-01-01T00:00:00Z;features=macro run").is_err());
        assert!(decode(b"ver=1;exp=2030-01-01T00:00:00Z;features=a,,b").is_err());
    }

    #[test]
    fn nonce_and_tick_together_are_duplicates() {
        let err = decode(b"ver=1;exp=2030-01-01T00:00:00Z;tick=1;nonce=2").unwrap_err();
        assert_eq!(err.reason(), "ParseError");
    }
}
