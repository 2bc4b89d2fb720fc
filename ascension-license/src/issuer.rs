//! Offline license issuance.
//!
//! The issuer holds the private half of the trust root and never runs
//! inside the plugin; it backs the operator CLI and the test suite.

use crate::claims::LicenseClaims;
use crate::codec;
use crate::error::{LicenseError, LicenseResult};
use crate::signature::TrustedKey;
use crate::token::LicenseToken;
use rand::rngs::OsRng;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::Sha256;
use zeroize::Zeroizing;

/// Modulus size for freshly generated issuer keys.
pub const ISSUER_KEY_BITS: usize = 2048;

/// Signs license claims into wire tokens.
pub struct LicenseIssuer {
    private_key: RsaPrivateKey,
}

impl std::fmt::Debug for LicenseIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseIssuer")
            .field("fingerprint", &self.public_key().fingerprint())
            .finish_non_exhaustive()
    }
}

impl LicenseIssuer {
    /// Generates a fresh 2048-bit signing key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyFormat` if key generation fails.
    pub fn generate() -> LicenseResult<Self> {
        RsaPrivateKey::new(&mut OsRng, ISSUER_KEY_BITS)
            .map(Self::from)
            .map_err(|e| LicenseError::InvalidKeyFormat(format!("key generation failed: {e}")))
    }

    /// Loads a signing key from PKCS#8 or PKCS#1 PEM.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyFormat` if the text is not an RSA private key.
    pub fn from_pem(text: &str) -> LicenseResult<Self> {
        let text = text.trim();
        RsaPrivateKey::from_pkcs8_pem(text)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(text))
            .map(Self::from)
            .map_err(|_| LicenseError::InvalidKeyFormat("secret key is not an RSA PEM".into()))
    }

    /// PKCS#8 PEM form of the secret, for writing the key file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyFormat` if the key cannot be DER-encoded.
    pub fn to_pem(&self) -> LicenseResult<Zeroizing<String>> {
        self.private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|_| LicenseError::InvalidKeyFormat("secret key encoding failed".into()))
    }

    /// The public key matching this issuer.
    #[must_use]
    pub fn public_key(&self) -> TrustedKey {
        TrustedKey::from(self.private_key.to_public_key())
    }

    /// Encodes and signs `claims` into a token.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` if the claims cannot be encoded.
    pub fn sign(&self, claims: &LicenseClaims) -> LicenseResult<LicenseToken> {
        let payload = codec::encode(claims)?;
        let signature = self.sign_payload(&payload);
        Ok(LicenseToken::canonical(payload, signature))
    }

    /// Signs raw payload bytes with PKCS#1 v1.5 over SHA-256.
    #[must_use]
    pub fn sign_payload(&self, payload: &[u8]) -> Vec<u8> {
        SigningKey::<Sha256>::new(self.private_key.clone())
            .sign(payload)
            .to_vec()
    }

    /// Encodes and signs `claims` into base64 wire text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` if the claims cannot be encoded.
    pub fn issue(&self, claims: &LicenseClaims) -> LicenseResult<String> {
        Ok(self.sign(claims)?.to_wire())
    }
}

impl From<RsaPrivateKey> for LicenseIssuer {
    fn from(private_key: RsaPrivateKey) -> Self {
        Self { private_key }
    }
}
