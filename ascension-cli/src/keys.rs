//! Signing key files.
//!
//! A key file holds the issuer's RSA private key as PKCS#8 PEM.

use anyhow::{Context, Result};
use ascension_license::LicenseIssuer;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Reads a signing key file.
pub fn load_issuer(path: &Path) -> Result<LicenseIssuer> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read signing key {}", path.display()))?;
    LicenseIssuer::from_pem(&text)
        .with_context(|| format!("invalid signing key in {}", path.display()))
}

/// Writes a new signing key file. Refuses to overwrite.
pub fn write_secret_key(path: &Path, issuer: &LicenseIssuer) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let pem = issuer.to_pem().context("failed to encode signing key")?;
    file.write_all(pem.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
