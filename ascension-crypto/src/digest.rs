//! SHA-256 content digests.

use crate::error::CryptoResult;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Size of a SHA-256 digest in bytes.
pub const DIGEST_SIZE: usize = 32;

/// A 256-bit content digest.
pub type Digest256 = [u8; DIGEST_SIZE];

/// Hashes a byte slice.
#[must_use]
pub fn sha256(data: &[u8]) -> Digest256 {
    Sha256::digest(data).into()
}

/// Hashes the full contents of a file, streaming it in chunks.
pub fn sha256_file(path: &Path) -> CryptoResult<Digest256> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().into())
}
