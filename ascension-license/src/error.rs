//! Error types for the licensing module.

use thiserror::Error;

/// Licensing-specific errors.
///
/// `Display` text is for logs. Callers that surface a denial to users use
/// [`LicenseError::reason`] / [`LicenseError::reason_code`], which never
/// carry parser detail or key material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LicenseError {
    /// The wire token is malformed (base64, delimiter, segment count).
    #[error("invalid license format: {0}")]
    InvalidKeyFormat(String),

    /// The signed payload does not decode to a claims record.
    #[error("invalid license payload: {0}")]
    InvalidPayload(String),

    /// Signature verification failed.
    #[error("license signature invalid")]
    InvalidSignature,

    /// The license is past expiry and grace.
    #[error("license expired on {0}")]
    Expired(String),

    /// The license is bound to another device.
    #[error("license is bound to a different device")]
    DeviceMismatch,

    /// The license is bound to another subject.
    #[error("license is bound to a different subject")]
    SubjectMismatch,

    /// The license names an issuer this deployment does not trust.
    #[error("license issuer mismatch")]
    IssuerMismatch,

    /// No license is active.
    #[error("license not activated")]
    NotActivated,

    /// The active license does not include the feature.
    #[error("feature not licensed: {0}")]
    FeatureDenied(String),

    /// The program changed on disk; licensing is locked for this process.
    #[error("tamper detected; licensing locked")]
    TamperDetected,

    /// Reading or writing the persisted license failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl LicenseError {
    /// Taxonomy name safe to show to users.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidKeyFormat(_) | Self::InvalidPayload(_) => "ParseError",
            Self::InvalidSignature => "InvalidSignature",
            Self::Expired(_) => "Expired",
            Self::DeviceMismatch => "DeviceMismatch",
            Self::SubjectMismatch => "SubjectMismatch",
            Self::IssuerMismatch => "IssuerMismatch",
            Self::NotActivated => "NoLicense",
            Self::FeatureDenied(_) => "FeatureDenied",
            Self::TamperDetected => "TamperDetected",
            Self::Storage(_) => "StorageError",
        }
    }

    /// Machine-checkable snake_case code, used after a `license_` prefix.
    #[must_use]
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::InvalidKeyFormat(_) | Self::InvalidPayload(_) => "parse_error",
            Self::InvalidSignature => "invalid_signature",
            Self::Expired(_) => "expired",
            Self::DeviceMismatch => "device_mismatch",
            Self::SubjectMismatch => "subject_mismatch",
            Self::IssuerMismatch => "issuer_mismatch",
            Self::NotActivated => "no_license",
            Self::FeatureDenied(_) => "feature_denied",
            Self::TamperDetected => "tamper_detected",
            Self::Storage(_) => "storage_error",
        }
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
