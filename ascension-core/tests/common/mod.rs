//! Shared test helpers for core tests.

#![allow(dead_code)]

use ascension_core::{SecurityConfig, SecurityCore, TamperGuard};
use ascension_crypto::PassthroughEncryptor;
use ascension_license::{
    DeviceFingerprint, LicenseClaims, LicenseIssuer, LicenseStore, LicenseVault,
};
use ascension_pairing::{CapabilityAuthority, PairingCodeGenerator};
use ascension_types::ManualClock;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::path::Path;
use std::sync::Arc;

pub const PAIRING_SEED: &[u8; 32] = b"ascension-test-pairing-seed-0001";
pub const SERVER_KEY: &[u8; 32] = b"ascension-test-capability-key-01";

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap()
}

pub const TEST_ISSUER_PEM: &str =
    include_str!("../../../ascension-license/tests/fixtures/test_issuer.pem");

pub fn test_issuer() -> LicenseIssuer {
    LicenseIssuer::from_pem(TEST_ISSUER_PEM).unwrap()
}

pub fn test_device() -> DeviceFingerprint {
    DeviceFingerprint::from_identifiers("machine-under-test", "tester")
}

/// Signed license for `macro.run` and `hud.read`, expiring `secs` after
/// [`epoch`].
pub fn license_expiring_in(secs: i64, grace: u64) -> String {
    let claims = LicenseClaims::new(epoch() + Duration::seconds(secs))
        .with_subject("Valkyrie")
        .with_grace_seconds(grace)
        .with_features(["macro.run", "hud.read"]);
    test_issuer().issue(&claims).unwrap()
}

/// Default configuration with the identity test licenses are bound to.
pub fn test_config() -> SecurityConfig {
    SecurityConfig {
        subject: Some("Valkyrie".into()),
        ..SecurityConfig::default()
    }
}

pub struct Harness {
    pub core: SecurityCore,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(test_config(), None, TamperGuard::disabled())
    }

    pub fn persistent(dir: &Path) -> Self {
        Self::build(test_config(), Some(dir), TamperGuard::disabled())
    }

    pub fn with_tamper(config: SecurityConfig, guard: TamperGuard) -> Self {
        Self::build(config, None, guard)
    }

    pub fn build(config: SecurityConfig, dir: Option<&Path>, tamper: TamperGuard) -> Self {
        let clock = Arc::new(ManualClock::new(epoch()));

        let mut license = LicenseStore::new(test_issuer().public_key())
            .with_device(test_device())
            .with_clock(clock.clone())
            .with_policy(config.license_policy());
        if let Some(dir) = dir {
            license = license.with_vault(LicenseVault::new(
                dir.join("license.bin"),
                Arc::new(PassthroughEncryptor),
            ));
        }

        let pairing = PairingCodeGenerator::new(PAIRING_SEED, clock.clone())
            .unwrap()
            .with_window_secs(config.pairing.window_secs)
            .with_word_count(config.pairing.word_count);
        let capabilities =
            CapabilityAuthority::new(SERVER_KEY, pairing, config.capability_policy()).unwrap();

        let core = SecurityCore::with_parts(config, license, capabilities, tamper);
        Self { core, clock }
    }

    pub fn pairing_code(&self) -> String {
        self.core.capabilities().pairing().current_code()
    }

    /// Issues a capability for `scopes` and returns the token.
    pub fn capability(&self, scopes: &[&str]) -> String {
        let scopes: Vec<String> = scopes.iter().map(|s| (*s).to_string()).collect();
        let response = self
            .core
            .issue_capability(&self.pairing_code(), Some(scopes.as_slice()), Some(1800));
        response.grant().expect("capability issued").token.clone()
    }
}
