//! Security core for Ascension.
//!
//! Composes licensing, device pairing and capabilities behind one facade
//! that transport handlers call:
//!
//! - [`SecurityCore::is_feature_allowed`] and [`SecurityCore::authorize`]
//!   gate automation features
//! - [`SecurityCore::issue_capability`] trades a pairing code for a bearer
//!   capability
//! - [`SecurityCore::apply_license`] and friends manage the license
//!
//! [`SecurityMonitors`] runs the tamper recheck and expiry tick in the
//! background.

mod config;
mod error;
mod facade;
mod monitor;
mod responses;
mod tamper;

pub use config::{PairingConfig, SecurityConfig, TamperConfig, CONFIG_FILE_NAME};
pub use error::{ConfigError, CoreError, CoreResult};
pub use facade::SecurityCore;
pub use monitor::SecurityMonitors;
pub use responses::{
    ApplyLicenseResponse, AuthorizeResponse, CapabilityGrant, ErrorResponse, FeatureDecision,
    IssueCapabilityResponse, LicenseStatusResponse, OkResponse, PairingInfoResponse,
};
pub use tamper::{TamperCheck, TamperGuard};
