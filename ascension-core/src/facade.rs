//! The single entry point the surrounding plugin calls.
//!
//! `SecurityCore` owns the license store, the capability authority and
//! the tamper guard. Transport handlers never touch those directly; they
//! call the operations below and forward the serializable responses.

use crate::config::SecurityConfig;
use crate::error::CoreResult;
use crate::responses::{
    ApplyLicenseResponse, AuthorizeResponse, CapabilityGrant, ErrorResponse, FeatureDecision,
    IssueCapabilityResponse, LicenseStatusResponse, OkResponse, PairingInfoResponse,
};
use crate::tamper::{TamperCheck, TamperGuard};
use ascension_crypto::SecretKey;
use ascension_license::{
    format_remaining, DeviceFingerprint, LicenseError, LicenseSnapshot, LicenseState,
    LicenseStore, LicenseVault,
};
use ascension_pairing::{CapabilityAuthority, PairingCodeGenerator};
use ascension_types::{Clock, SystemClock};
use std::sync::Arc;
use tracing::{info, warn};

/// Composes licensing, capabilities and tamper detection.
#[derive(Debug)]
pub struct SecurityCore {
    config: SecurityConfig,
    license: LicenseStore,
    capabilities: CapabilityAuthority,
    tamper: TamperGuard,
}

impl SecurityCore {
    /// Builds the core for this process from configuration.
    ///
    /// Capability and pairing secrets are fresh random keys, so tokens and
    /// codes do not survive a restart.
    ///
    /// # Errors
    ///
    /// Fails if the trust root or the license vault cannot be set up.
    pub fn from_config(config: SecurityConfig) -> CoreResult<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let device = DeviceFingerprint::generate();
        if device.is_unknown() {
            warn!("Device fingerprint unavailable; device-bound licenses will not apply");
        }

        let mut license = LicenseStore::new(config.trusted_key()?)
            .with_device(device.clone())
            .with_clock(Arc::clone(&clock))
            .with_policy(config.license_policy());
        if let Some(path) = config.resolved_license_path() {
            license = license.with_vault(LicenseVault::for_device(path, &device)?);
        }

        let pairing_seed = SecretKey::random();
        let pairing = PairingCodeGenerator::new(pairing_seed.as_bytes(), clock)?
            .with_window_secs(config.pairing.window_secs)
            .with_word_count(config.pairing.word_count);
        let capability_secret = SecretKey::random();
        let capabilities = CapabilityAuthority::new(
            capability_secret.as_bytes(),
            pairing,
            config.capability_policy(),
        )?;

        let tamper = match (config.tamper.enabled, config.tamper.binary_path.as_ref()) {
            (false, _) => TamperGuard::disabled(),
            (true, Some(path)) => TamperGuard::capture(path.clone()),
            (true, None) => TamperGuard::for_current_exe(),
        };

        Ok(Self::with_parts(config, license, capabilities, tamper))
    }

    /// Assembles the core from prepared parts.
    #[must_use]
    pub fn with_parts(
        config: SecurityConfig,
        license: LicenseStore,
        capabilities: CapabilityAuthority,
        tamper: TamperGuard,
    ) -> Self {
        Self {
            config,
            license,
            capabilities,
            tamper,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    #[must_use]
    pub fn license(&self) -> &LicenseStore {
        &self.license
    }

    #[must_use]
    pub fn capabilities(&self) -> &CapabilityAuthority {
        &self.capabilities
    }

    #[must_use]
    pub fn tamper_guard(&self) -> &TamperGuard {
        &self.tamper
    }

    /// Whether `feature` may run right now, per the license alone.
    #[must_use]
    pub fn is_feature_allowed(&self, feature: &str) -> FeatureDecision {
        match self.license.check_feature(feature) {
            Ok(snapshot) => FeatureDecision {
                allowed: true,
                reason: None,
                state: snapshot.state,
            },
            Err(e) => FeatureDecision {
                allowed: false,
                reason: Some(e.reason().to_string()),
                state: self.license.state(),
            },
        }
    }

    /// Checks a bearer capability for `required_scope` and the license
    /// for the feature of the same name.
    #[must_use]
    pub fn authorize(&self, bearer: &str, required_scope: &str) -> AuthorizeResponse {
        self.authorize_feature(bearer, required_scope, required_scope)
    }

    /// Like [`Self::authorize`] with a license feature distinct from the
    /// capability scope.
    #[must_use]
    pub fn authorize_feature(
        &self,
        bearer: &str,
        required_scope: &str,
        feature: &str,
    ) -> AuthorizeResponse {
        if let Err(e) = self.capabilities.authorize(bearer, required_scope) {
            return AuthorizeResponse::denied(format!("capability_{}", e.reason()));
        }
        if let Err(e) = self.license.check_feature(feature) {
            return AuthorizeResponse::denied(format!("license_{}", e.reason_code()));
        }
        AuthorizeResponse::allowed()
    }

    /// Exchanges a pairing code for a capability.
    #[must_use]
    pub fn issue_capability(
        &self,
        pairing_code: &str,
        scopes: Option<&[String]>,
        ttl_secs: Option<u64>,
    ) -> IssueCapabilityResponse {
        match self
            .capabilities
            .issue(pairing_code, scopes.unwrap_or_default(), ttl_secs)
        {
            Ok(issued) => IssueCapabilityResponse::Issued(CapabilityGrant {
                expires_at: issued.expires_at(),
                scopes: issued.scopes().iter().cloned().collect(),
                token: issued.token,
            }),
            Err(e) => IssueCapabilityResponse::Denied(ErrorResponse {
                error: e.reason().to_string(),
            }),
        }
    }

    /// Revokes a capability. Always acknowledges.
    #[must_use]
    pub fn revoke_capability(&self, token: &str) -> OkResponse {
        self.capabilities.revoke(token);
        OkResponse {
            ok: true,
            reason: None,
        }
    }

    /// Verifies, activates and persists a license.
    #[must_use]
    pub fn apply_license(&self, wire: &str) -> ApplyLicenseResponse {
        match self.license.apply(wire) {
            Ok(snapshot) => accepted(&snapshot),
            Err(e) => ApplyLicenseResponse::rejected(e.reason()),
        }
    }

    /// Re-reads the persisted license.
    #[must_use]
    pub fn reload_license(&self) -> ApplyLicenseResponse {
        match self.license.reload() {
            Ok(Some(snapshot)) => accepted(&snapshot),
            Ok(None) => ApplyLicenseResponse::rejected(LicenseError::NotActivated.reason()),
            Err(e) => ApplyLicenseResponse::rejected(e.reason()),
        }
    }

    /// Switches the bound identity, e.g. after a character change, and
    /// re-evaluates the license against it.
    #[must_use]
    pub fn set_subject(&self, subject: Option<&str>) -> ApplyLicenseResponse {
        let subject = subject
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        info!(subject = subject.as_deref().unwrap_or("-"), "Bound identity changed");
        match self.license.set_subject(subject) {
            Ok(Some(snapshot)) => accepted(&snapshot),
            Ok(None) => ApplyLicenseResponse::rejected(LicenseError::NotActivated.reason()),
            Err(e) => ApplyLicenseResponse::rejected(e.reason()),
        }
    }

    /// Drops the license and deletes the stored copy.
    #[must_use]
    pub fn clear_license(&self) -> OkResponse {
        match self.license.clear() {
            Ok(()) => OkResponse {
                ok: true,
                reason: None,
            },
            Err(e) => OkResponse {
                ok: false,
                reason: Some(e.reason().to_string()),
            },
        }
    }

    /// Current license status.
    #[must_use]
    pub fn license_status(&self) -> LicenseStatusResponse {
        let device = self.license.device().id().to_string();
        let state = self.license.state();
        let reason = match state {
            LicenseState::Valid => None,
            LicenseState::Unset => Some("no_license"),
            LicenseState::ExpiredInGrace => Some("expired_in_grace"),
            LicenseState::Expired => Some("expired"),
            LicenseState::TamperLocked => Some("tamper_detected"),
        }
        .map(str::to_string);

        let Some(snapshot) = self.license.snapshot() else {
            return LicenseStatusResponse {
                ok: false,
                reason,
                state,
                subject: None,
                features: Vec::new(),
                expires_at: None,
                grace: 0,
                seconds_left: 0,
                grace_seconds_left: 0,
                time_left: format_remaining(0),
                device,
            };
        };

        let seconds_left = snapshot.seconds_until_expiry().max(0);
        let grace_seconds_left = snapshot.grace_seconds_left();
        let time_left = match snapshot.state {
            LicenseState::ExpiredInGrace => format_remaining(grace_seconds_left),
            _ => format_remaining(seconds_left),
        };

        LicenseStatusResponse {
            ok: snapshot.state.is_usable(),
            reason,
            state: snapshot.state,
            subject: snapshot.claims.subject.clone(),
            features: snapshot.claims.features.iter().cloned().collect(),
            expires_at: Some(snapshot.claims.expires_at),
            grace: snapshot.claims.grace_seconds,
            seconds_left,
            grace_seconds_left,
            time_left,
            device,
        }
    }

    /// Current pairing code and how to reach this instance.
    #[must_use]
    pub fn pairing_info(&self) -> PairingInfoResponse {
        let pairing = self.capabilities.pairing();
        let policy = self.capabilities.policy();
        let code = pairing.current_code();
        let expires_at = pairing.window_expires_at();
        let host = self.config.pairing.host.clone();
        let port = self.config.pairing.port;
        let uri = format!(
            "ascension://pair?host={host}&port={port}&code={code}&exp={}",
            expires_at.timestamp()
        );

        PairingInfoResponse {
            code,
            expires_at,
            host,
            port,
            scopes: policy.default_scopes.iter().cloned().collect(),
            window_seconds: pairing.window_secs(),
            capability_ttl_seconds: policy.default_ttl_secs,
            uri,
        }
    }

    /// Runs one tamper check. Locks licensing if the file changed or can
    /// no longer be read.
    pub fn check_tamper(&self) -> TamperCheck {
        let outcome = self.tamper.check();
        if outcome.is_violation() {
            self.license.tamper_lock();
        }
        outcome
    }

    /// Loads the persisted license, if any. Called once at startup.
    pub fn startup(&self) -> LicenseState {
        match self.license.reload() {
            Ok(Some(snapshot)) => info!(state = %snapshot.state, "License restored"),
            Ok(None) => info!("No license on record"),
            Err(e) => warn!(reason = e.reason(), "Stored license rejected"),
        }
        self.license.state()
    }
}

fn accepted(snapshot: &LicenseSnapshot) -> ApplyLicenseResponse {
    ApplyLicenseResponse {
        ok: true,
        reason: None,
        state: Some(snapshot.state),
        expires_at: Some(snapshot.claims.expires_at),
        features: Some(snapshot.claims.features.iter().cloned().collect()),
    }
}
