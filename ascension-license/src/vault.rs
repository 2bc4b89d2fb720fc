//! Encrypted persistence for the last accepted license.
//!
//! One file, sealed through a [`DataEncryptor`]. Writes go to a sibling
//! temp file and are renamed into place so a crash never leaves a torn
//! license behind.

use crate::device::DeviceFingerprint;
use crate::error::{LicenseError, LicenseResult};
use ascension_crypto::{DataEncryptor, UserScopedEncryptor};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// File name under the data directory.
pub const LICENSE_FILE_NAME: &str = "license.bin";

/// Label bound into the sealed blob.
const VAULT_LABEL: &str = "ascension.license";

/// Persists the raw license blob at rest.
pub struct LicenseVault {
    path: PathBuf,
    encryptor: Arc<dyn DataEncryptor>,
}

impl std::fmt::Debug for LicenseVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseVault")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl LicenseVault {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, encryptor: Arc<dyn DataEncryptor>) -> Self {
        Self {
            path: path.into(),
            encryptor,
        }
    }

    /// Vault sealed with a key derived from the device fingerprint, so the
    /// file does not open under another machine or account.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if key derivation fails.
    pub fn for_device(path: impl Into<PathBuf>, device: &DeviceFingerprint) -> LicenseResult<Self> {
        let encryptor = UserScopedEncryptor::new(device.id())
            .map_err(|e| LicenseError::Storage(e.to_string()))?;
        Ok(Self::new(path, Arc::new(encryptor)))
    }

    /// `<local data dir>/Ascension/license.bin`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("Ascension").join(LICENSE_FILE_NAME))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seals and writes `blob`, replacing any previous file.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on encryption or I/O failure.
    pub fn save(&self, blob: &[u8]) -> LicenseResult<()> {
        let sealed = self
            .encryptor
            .encrypt_bytes(VAULT_LABEL, blob)
            .map_err(|e| LicenseError::Storage(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(storage_error)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, &sealed).map_err(storage_error)?;
        std::fs::rename(&tmp, &self.path).map_err(storage_error)?;

        debug!(path = %self.path.display(), "License persisted");
        Ok(())
    }

    /// Reads and opens the stored blob, if any.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the file exists but cannot be read or opened.
    pub fn load(&self) -> LicenseResult<Option<Vec<u8>>> {
        let sealed = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error(e)),
        };
        self.encryptor
            .decrypt_bytes(VAULT_LABEL, &sealed)
            .map(Some)
            .map_err(|e| LicenseError::Storage(e.to_string()))
    }

    /// Deletes the stored file. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the file exists but cannot be removed.
    pub fn clear(&self) -> LicenseResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(e)),
        }
    }
}

fn storage_error(e: std::io::Error) -> LicenseError {
    LicenseError::Storage(e.to_string())
}
