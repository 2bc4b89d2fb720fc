//! Serializable results of the facade operations.
//!
//! Field names are camelCase on the wire; absent optionals are omitted.

use ascension_license::LicenseState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of `is_feature_allowed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub state: LicenseState,
}

/// Result of `authorize`. `reason` is `capability_<r>` or `license_<r>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AuthorizeResponse {
    #[must_use]
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    #[must_use]
    pub fn denied(reason: String) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// A granted capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityGrant {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub scopes: Vec<String>,
}

/// A refused request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Result of `issue_capability`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssueCapabilityResponse {
    Issued(CapabilityGrant),
    Denied(ErrorResponse),
}

impl IssueCapabilityResponse {
    #[must_use]
    pub fn grant(&self) -> Option<&CapabilityGrant> {
        match self {
            Self::Issued(grant) => Some(grant),
            Self::Denied(_) => None,
        }
    }
}

/// Plain acknowledgement, for revoke and clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Result of `apply_license` and `reload_license`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyLicenseResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<LicenseState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
}

impl ApplyLicenseResponse {
    #[must_use]
    pub fn rejected(reason: &str) -> Self {
        Self {
            ok: false,
            reason: Some(reason.to_string()),
            state: None,
            expires_at: None,
            features: None,
        }
    }
}

/// Result of `license_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseStatusResponse {
    /// True while features may pass.
    pub ok: bool,
    /// `no_license`, `expired_in_grace`, `expired` or `tamper_detected`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub state: LicenseState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub features: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Grace period granted by the license.
    pub grace: u64,
    /// Seconds of validity left, then seconds of grace left.
    pub seconds_left: i64,
    pub grace_seconds_left: i64,
    /// Short display of whichever of the two is running.
    pub time_left: String,
    pub device: String,
}

/// Result of `pairing_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingInfoResponse {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub host: String,
    pub port: u16,
    pub scopes: Vec<String>,
    pub window_seconds: u64,
    pub capability_ttl_seconds: u64,
    /// `ascension://pair?...`, for QR display.
    pub uri: String,
}
