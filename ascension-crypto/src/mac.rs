//! HMAC-SHA256 and constant-time comparison.

use crate::error::{CryptoError, CryptoResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Size of an HMAC-SHA256 tag in bytes.
pub const MAC_SIZE: usize = 32;

/// A keyed HMAC-SHA256 instance.
///
/// Keying happens once; every `compute`/`verify` clones the keyed state,
/// so the hot paths cannot fail.
#[derive(Clone)]
pub struct MacKey {
    keyed: HmacSha256,
}

impl MacKey {
    /// Keys a new HMAC-SHA256 instance.
    pub fn new(key: &[u8]) -> CryptoResult<Self> {
        let keyed = HmacSha256::new_from_slice(key)
            .map_err(|e| CryptoError::KeyDerivation(format!("invalid mac key: {e}")))?;
        Ok(Self { keyed })
    }

    /// Computes the tag over `data`.
    #[must_use]
    pub fn compute(&self, data: &[u8]) -> [u8; MAC_SIZE] {
        let mut mac = self.keyed.clone();
        mac.update(data);
        mac.finalize().into_bytes().into()
    }

    /// Verifies `tag` over `data` in constant time.
    ///
    /// A tag of the wrong length is rejected without distinguishing it from
    /// a wrong value.
    #[must_use]
    pub fn verify(&self, data: &[u8], tag: &[u8]) -> bool {
        let mut mac = self.keyed.clone();
        mac.update(data);
        mac.verify_slice(tag).is_ok()
    }
}

impl std::fmt::Debug for MacKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacKey").field("key", &"[REDACTED]").finish()
    }
}

/// Computes `HMAC-SHA256(key, data)`.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> CryptoResult<[u8; MAC_SIZE]> {
    Ok(MacKey::new(key)?.compute(data))
}

/// Verifies `tag` against `HMAC-SHA256(key, data)` in constant time.
#[must_use]
pub fn verify_hmac_sha256(key: &[u8], data: &[u8], tag: &[u8]) -> bool {
    MacKey::new(key).is_ok_and(|mac| mac.verify(data, tag))
}

/// Compares two byte strings without short-circuiting on the first
/// differing byte.
///
/// Length is not secret: slices of different length compare unequal.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 4231 test case 2.
    #[test]
    fn rfc4231_case_2() {
        let tag = hmac_sha256(b"Jefe", b"what do ya want for nothing?").unwrap();
        let expected = [
            0x5b, 0xdc, 0xc1, 0x46, 0xbf, 0x60, 0x75, 0x4e, 0x6a, 0x04, 0x24, 0x26, 0x08, 0x95,
            0x75, 0xc7, 0x5a, 0x00, 0x3f, 0x08, 0x9d, 0x27, 0x39, 0x83, 0x9d, 0xec, 0x58, 0xb9,
            0x64, 0xec, 0x38, 0x43,
        ];
        assert_eq!(tag, expected);
    }

    #[test]
    fn verify_rejects_truncated_tag() {
        let tag = hmac_sha256(b"k", b"data").unwrap();
        assert!(verify_hmac_sha256(b"k", b"data", &tag));
        assert!(!verify_hmac_sha256(b"k", b"data", &tag[..31]));
        assert!(!verify_hmac_sha256(b"k", b"data", &[]));
    }

    #[test]
    fn keyed_instance_is_reusable() {
        let key = MacKey::new(b"secret").unwrap();
        let a = key.compute(b"one");
        let b = key.compute(b"one");
        assert_eq!(a, b);
        assert_ne!(a, key.compute(b"two"));
        assert!(key.verify(b"two", &key.compute(b"two")));
    }

    #[test]
    fn ct_eq_lengths() {
        assert!(constant_time_eq(b"", b""));
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
