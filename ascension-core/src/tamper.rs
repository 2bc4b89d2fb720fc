//! Self-integrity checking.
//!
//! The guard hashes the program file once at startup and compares every
//! later hash against that baseline in constant time. A mismatch is
//! reported once and the caller locks licensing for good. Once a baseline
//! exists, a file that can no longer be read counts as a violation too.

use ascension_crypto::{constant_time_eq, sha256_file, Digest256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of one integrity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TamperCheck {
    /// The file still matches the baseline.
    Unchanged,
    /// The file differs from the baseline.
    Modified,
    /// The file could not be read after a baseline was captured.
    Unreadable,
    /// No baseline was captured.
    Disabled,
}

impl TamperCheck {
    /// Returns true if this outcome must lock licensing.
    #[must_use]
    pub fn is_violation(self) -> bool {
        matches!(self, Self::Modified | Self::Unreadable)
    }
}

/// Baseline digest of the program file.
#[derive(Debug, Clone)]
pub struct TamperGuard {
    path: PathBuf,
    baseline: Option<Digest256>,
}

impl TamperGuard {
    /// Captures a baseline for `path`. If the file cannot be hashed the
    /// guard is disabled.
    #[must_use]
    pub fn capture(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let baseline = match sha256_file(&path) {
            Ok(digest) => {
                info!(path = %path.display(), "Tamper baseline captured");
                Some(digest)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Tamper baseline unavailable; guard disabled");
                None
            }
        };
        Self { path, baseline }
    }

    /// Captures a baseline for the running executable.
    #[must_use]
    pub fn for_current_exe() -> Self {
        match std::env::current_exe() {
            Ok(path) => Self::capture(path),
            Err(e) => {
                warn!(error = %e, "Cannot locate running executable; tamper guard disabled");
                Self::disabled()
            }
        }
    }

    /// A guard that never reports changes.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            path: PathBuf::new(),
            baseline: None,
        }
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.baseline.is_some()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-hashes the file and compares it to the baseline.
    #[must_use]
    pub fn check(&self) -> TamperCheck {
        let Some(baseline) = &self.baseline else {
            return TamperCheck::Disabled;
        };
        match sha256_file(&self.path) {
            Ok(current) if constant_time_eq(&current, baseline) => {
                debug!("Tamper check passed");
                TamperCheck::Unchanged
            }
            Ok(_) => TamperCheck::Modified,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Program file unreadable since baseline");
                TamperCheck::Unreadable
            }
        }
    }
}
