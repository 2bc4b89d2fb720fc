//! Device fingerprinting for license binding.
//!
//! The fingerprint is `sha256(machine_id | user)`, truncated to 16 bytes
//! and rendered as lowercase hex. It is comparable but does not reveal
//! the raw identifiers. Any failure to read an identifier yields the
//! `unknown` sentinel, which never matches a bound license.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;

/// Sentinel used when no identifier could be read.
pub const UNKNOWN_FINGERPRINT: &str = "unknown";

/// Number of digest bytes kept.
const FINGERPRINT_BYTES: usize = 16;

/// A stable fingerprint that identifies this machine and user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceFingerprint {
    id: String,
}

impl DeviceFingerprint {
    /// Fingerprints the current machine and user.
    #[must_use]
    pub fn generate() -> Self {
        match (machine_id(), user_name()) {
            (Some(machine), Some(user)) => Self::from_identifiers(&machine, &user),
            _ => Self::unknown(),
        }
    }

    /// Fingerprints explicit identifiers.
    #[must_use]
    pub fn from_identifiers(machine_id: &str, user: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(machine_id.as_bytes());
        hasher.update(b"|");
        hasher.update(user.as_bytes());
        let hash = hasher.finalize();

        Self {
            id: hex::encode(&hash[..FINGERPRINT_BYTES]),
        }
    }

    #[must_use]
    pub fn unknown() -> Self {
        Self {
            id: UNKNOWN_FINGERPRINT.to_string(),
        }
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.id == UNKNOWN_FINGERPRINT
    }

    /// Returns the fingerprint ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns true if `bound` names this device. Case-insensitive; the
    /// unknown fingerprint matches nothing.
    #[must_use]
    pub fn matches(&self, bound: &str) -> bool {
        !self.is_unknown() && self.id.eq_ignore_ascii_case(bound.trim())
    }
}

impl std::fmt::Display for DeviceFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

fn user_name() -> Option<String> {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .ok()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
}

/// Platform machine ID, falling back to the hostname.
fn machine_id() -> Option<String> {
    platform_machine_id()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .or_else(hostname_id)
}

fn hostname_id() -> Option<String> {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
}

fn platform_machine_id() -> Option<String> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .lines()
                    .find(|l| l.contains("IOPlatformUUID"))
                    .and_then(|l| l.split('"').nth(3))
                    .map(String::from)
            })
    }

    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/machine-id")
            .or_else(|_| std::fs::read_to_string("/var/lib/dbus/machine-id"))
            .ok()
    }

    #[cfg(target_os = "windows")]
    {
        // MachineGuid from the registry via reg.exe.
        std::process::Command::new("reg")
            .args([
                "query",
                r"HKLM\SOFTWARE\Microsoft\Cryptography",
                "/v",
                "MachineGuid",
            ])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .lines()
                    .find(|l| l.contains("MachineGuid"))
                    .and_then(|l| l.split_whitespace().last())
                    .map(String::from)
            })
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        None
    }
}
