//! RSASSA-PKCS1-v1_5 / SHA-256 verification against a single trust root.
//!
//! Every failure (wrong length, bad encoding, mismatch) collapses into one
//! `false`; callers map it to `InvalidSignature` without detail.

use crate::error::{LicenseError, LicenseResult};
use base64::{engine::general_purpose::STANDARD, Engine};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::signature::Verifier;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPublicKey};
use sha2::{Digest, Sha256};

/// Modulus of the production trust root (2048-bit, base64 big-endian).
const EMBEDDED_MODULUS: &str = "56ls1zZxQTLw4NYv03y67MkdOC8M8AUuJIiy6pvmTilOnsMd25uDQMt/YIINyoXjPwfol/+bplp9RDVYZvNVvh80eFhPhxutYHZIFPi2RRMVcGtqehrMxVUSrp1IA9XURlpR9ZF0IpG8oB4t86xVSJrEbE29GD5LY3HdfZ0TUfk64eosx1dzcJgPWRG/lZYIpG0Ai2lryScLpYsQb7taDGdzL/uv5fnWkPWGU0/ynP12LEYZ3PBYfrKgwF/BKYP4+jmw2IFUbD9xGq6hnIsAm5QoTflTUqt2pJz1sNLN2aaWvCCnJkI1Ls2Mo+mApQSZp5oM08NYpFWrWVM5CewXWQ==";

/// Public exponent of the production trust root (65537).
const EMBEDDED_EXPONENT: &str = "AQAB";

/// The public key licenses are verified against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedKey(RsaPublicKey);

impl TrustedKey {
    /// Returns the key compiled into this build.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded components are not a valid RSA key.
    pub fn embedded() -> LicenseResult<Self> {
        Self::from_base64_components(EMBEDDED_MODULUS, EMBEDDED_EXPONENT)
    }

    /// Builds a trust root from big-endian modulus and exponent bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyFormat` if the components do not form a key.
    pub fn from_components(modulus: &[u8], exponent: &[u8]) -> LicenseResult<Self> {
        RsaPublicKey::new(BigUint::from_bytes_be(modulus), BigUint::from_bytes_be(exponent))
            .map(Self)
            .map_err(|_| LicenseError::InvalidKeyFormat("invalid public key".into()))
    }

    /// Builds a trust root from base64 modulus and exponent text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyFormat` if either part is not base64 or the
    /// components do not form a key.
    pub fn from_base64_components(modulus: &str, exponent: &str) -> LicenseResult<Self> {
        let decode = |text: &str| {
            STANDARD
                .decode(text.trim())
                .map_err(|_| LicenseError::InvalidKeyFormat("key component is not base64".into()))
        };
        Self::from_components(&decode(modulus)?, &decode(exponent)?)
    }

    /// Parses a public key from PEM (SPKI or PKCS#1) or from an
    /// `<RSAKeyValue>` XML document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyFormat` if the text is none of those.
    pub fn parse(text: &str) -> LicenseResult<Self> {
        let text = text.trim();
        if text.starts_with('<') {
            return Self::from_xml(text);
        }
        RsaPublicKey::from_public_key_pem(text)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(text))
            .map(Self)
            .map_err(|_| LicenseError::InvalidKeyFormat("public key is not PEM".into()))
    }

    /// Parses `<RSAKeyValue><Modulus>..</Modulus><Exponent>..</Exponent></RSAKeyValue>`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyFormat` if either element is missing.
    pub fn from_xml(text: &str) -> LicenseResult<Self> {
        let modulus = xml_element(text, "Modulus")
            .ok_or_else(|| LicenseError::InvalidKeyFormat("missing Modulus".into()))?;
        let exponent = xml_element(text, "Exponent")
            .ok_or_else(|| LicenseError::InvalidKeyFormat("missing Exponent".into()))?;
        Self::from_base64_components(modulus, exponent)
    }

    /// SPKI PEM form of the key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyFormat` if the key cannot be DER-encoded.
    pub fn to_public_pem(&self) -> LicenseResult<String> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|_| LicenseError::InvalidKeyFormat("public key encoding failed".into()))
    }

    /// Short hex digest of the modulus, for logs and operator output.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.n().to_bytes_be());
        hex::encode(&digest[..8])
    }

    /// Modulus size in bits.
    #[must_use]
    pub fn bits(&self) -> usize {
        self.0.size() * 8
    }

    #[must_use]
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.0
    }

    /// Verifies `signature` over `payload`.
    #[must_use]
    pub fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        verify(payload, signature, self)
    }
}

impl From<RsaPublicKey> for TrustedKey {
    fn from(key: RsaPublicKey) -> Self {
        Self(key)
    }
}

/// Verifies a PKCS#1 v1.5 signature over the SHA-256 digest of `payload`.
#[must_use]
pub fn verify(payload: &[u8], signature: &[u8], key: &TrustedKey) -> bool {
    if signature.len() != key.0.size() {
        return false;
    }
    let Ok(signature) = Signature::try_from(signature) else {
        return false;
    };
    VerifyingKey::<Sha256>::new(key.0.clone())
        .verify(payload, &signature)
        .is_ok()
}

fn xml_element<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{name}>");
    let close = format!("</{name}>");
    let start = text.find(&open)? + open.len();
    let len = text[start..].find(&close)?;
    Some(text[start..start + len].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_key_is_2048_bit() {
        let key = TrustedKey::embedded().unwrap();
        assert_eq!(key.bits(), 2048);
        assert_eq!(key.public_key().e(), &BigUint::from(65_537u32));
    }

    #[test]
    fn embedded_key_roundtrips_through_pem_and_xml() {
        let key = TrustedKey::embedded().unwrap();
        let pem = key.to_public_pem().unwrap();
        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----"));
        assert_eq!(TrustedKey::parse(&pem).unwrap(), key);

        let xml = format!(
            "<RSAKeyValue><Modulus>{EMBEDDED_MODULUS}</Modulus><Exponent>{EMBEDDED_EXPONENT}</Exponent></RSAKeyValue>"
        );
        assert_eq!(TrustedKey::parse(&xml).unwrap(), key);
    }

    #[test]
    fn wrong_length_signature_is_rejected() {
        let key = TrustedKey::embedded().unwrap();
        assert!(!key.verify(b"payload", &[0u8; 64]));
        assert!(!key.verify(b"payload", &[0u8; 255]));
        assert!(!key.verify(b"payload", &[]));
    }

    #[test]
    fn full_length_garbage_is_rejected() {
        let key = TrustedKey::embedded().unwrap();
        assert!(!key.verify(b"payload", &[0x5a; 256]));
    }

    #[test]
    fn malformed_key_text_is_rejected() {
        assert!(TrustedKey::parse("abcd").is_err());
        assert!(TrustedKey::parse("<RSAKeyValue><Exponent>AQAB</Exponent></RSAKeyValue>").is_err());
        assert!(TrustedKey::from_base64_components("%%", "AQAB").is_err());
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let key = TrustedKey::embedded().unwrap();
        assert_eq!(key.fingerprint().len(), 16);
        assert_eq!(key.fingerprint(), TrustedKey::embedded().unwrap().fingerprint());
    }
}
