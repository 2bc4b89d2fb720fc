//! License claims and the time-derived license state.

use ascension_types::Nonce;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::device::DeviceFingerprint;

/// Feature (and device) wildcard.
pub const WILDCARD: &str = "*";

/// Device binding carried by a license.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceBinding {
    /// Usable on any device.
    Unbound,
    /// Usable only where the fingerprint matches.
    Bound(String),
}

impl DeviceBinding {
    /// Builds a binding from its wire text; empty and `*` mean unbound.
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == WILDCARD {
            Self::Unbound
        } else {
            Self::Bound(value.to_string())
        }
    }

    /// Returns the wire text for this binding.
    #[must_use]
    pub fn as_wire(&self) -> &str {
        match self {
            Self::Unbound => WILDCARD,
            Self::Bound(id) => id,
        }
    }

    /// Returns true if a license with this binding may run on `device`.
    #[must_use]
    pub fn permits(&self, device: &DeviceFingerprint) -> bool {
        match self {
            Self::Unbound => true,
            Self::Bound(id) => device.matches(id),
        }
    }
}

impl Default for DeviceBinding {
    fn default() -> Self {
        Self::Unbound
    }
}

/// The claims carried by a license.
///
/// A claims record is only ever trusted after its signature has been
/// verified; this type itself carries no proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseClaims {
    /// Bound identity (character name). `None` means unbound.
    pub subject: Option<String>,
    /// Expiry instant, always UTC.
    pub expires_at: DateTime<Utc>,
    /// Extra validity after expiry during which the license is flagged.
    pub grace_seconds: u64,
    /// Enabled features; `*` enables everything.
    pub features: BTreeSet<String>,
    /// Device the license is bound to.
    pub device: DeviceBinding,
    /// Uniqueness marker; not otherwise enforced.
    pub nonce: Nonce,
    /// Issuer identity, when the issuer chose to stamp one.
    pub issuer: Option<String>,
}

impl LicenseClaims {
    /// Creates unbound claims expiring at `expires_at` with no features.
    #[must_use]
    pub fn new(expires_at: DateTime<Utc>) -> Self {
        Self {
            subject: None,
            expires_at,
            grace_seconds: 0,
            features: BTreeSet::new(),
            device: DeviceBinding::Unbound,
            nonce: Nonce::new(),
            issuer: None,
        }
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn with_grace_seconds(mut self, grace_seconds: u64) -> Self {
        self.grace_seconds = grace_seconds;
        self
    }

    #[must_use]
    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = features.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn bound_to(mut self, device: DeviceBinding) -> Self {
        self.device = device;
        self
    }

    #[must_use]
    pub fn with_nonce(mut self, nonce: Nonce) -> Self {
        self.nonce = nonce;
        self
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Returns true if `feature` is enabled by these claims.
    #[must_use]
    pub fn allows(&self, feature: &str) -> bool {
        self.features.contains(WILDCARD) || self.features.contains(feature)
    }

    /// End of the grace period.
    #[must_use]
    pub fn grace_ends_at(&self) -> DateTime<Utc> {
        i64::try_from(self.grace_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|grace| self.expires_at.checked_add_signed(grace))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Evaluates the temporal state of these claims at `now`.
    ///
    /// `Valid` while `now <= expires_at`, `ExpiredInGrace` while
    /// `now <= expires_at + grace`, `Expired` afterwards.
    #[must_use]
    pub fn state_at(&self, now: DateTime<Utc>) -> LicenseState {
        if now <= self.expires_at {
            LicenseState::Valid
        } else if now <= self.grace_ends_at() {
            LicenseState::ExpiredInGrace
        } else {
            LicenseState::Expired
        }
    }
}

/// Global license state.
///
/// `Valid -> ExpiredInGrace -> Expired` is a pure function of time;
/// `TamperLocked` is sticky for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LicenseState {
    /// No license applied.
    Unset,
    /// Inside the validity period.
    Valid,
    /// Past expiry, inside grace. Usable, but callers should warn.
    ExpiredInGrace,
    /// Past expiry and grace.
    Expired,
    /// The program was modified after startup.
    TamperLocked,
}

impl LicenseState {
    /// Returns true if features may pass in this state.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Valid | Self::ExpiredInGrace)
    }

    /// Display name, matching the serialized form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unset => "Unset",
            Self::Valid => "Valid",
            Self::ExpiredInGrace => "ExpiredInGrace",
            Self::Expired => "Expired",
            Self::TamperLocked => "TamperLocked",
        }
    }
}

impl std::fmt::Display for LicenseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formats a remaining duration compactly: `2d 3h`, `4m 10s`, `0s`.
///
/// Seconds are only shown below one hour.
#[must_use]
pub fn format_remaining(secs: i64) -> String {
    if secs <= 0 {
        return "0s".to_string();
    }
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if seconds > 0 && secs < 3_600 {
        parts.push(format!("{seconds}s"));
    }
    if parts.is_empty() {
        format!("{secs}s")
    } else {
        parts.join(" ")
    }
}
