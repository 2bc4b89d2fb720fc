//! Shared test helpers for license tests.

#![allow(dead_code)]

use ascension_crypto::PassthroughEncryptor;
use ascension_license::{
    DeviceFingerprint, LicenseClaims, LicenseIssuer, LicenseStore, LicenseVault, TrustedKey,
};
use ascension_types::ManualClock;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::path::Path;
use std::sync::Arc;

/// Fixed instant every store test starts at.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap()
}

/// PKCS#8 key shared by every test suite in the workspace.
pub const TEST_ISSUER_PEM: &str = include_str!("../fixtures/test_issuer.pem");

/// Returns the fixed test issuer.
pub fn test_issuer() -> LicenseIssuer {
    LicenseIssuer::from_pem(TEST_ISSUER_PEM).unwrap()
}

pub fn test_key() -> TrustedKey {
    test_issuer().public_key()
}

pub fn test_device() -> DeviceFingerprint {
    DeviceFingerprint::from_identifiers("machine-under-test", "tester")
}

/// Claims expiring `secs` seconds after [`epoch`], enabling `macro.run`.
pub fn claims_expiring_in(secs: i64) -> LicenseClaims {
    LicenseClaims::new(epoch() + Duration::seconds(secs)).with_features(["macro.run", "hud.read"])
}

pub fn issue(claims: &LicenseClaims) -> String {
    test_issuer().issue(claims).unwrap()
}

/// A store on a manual clock at [`epoch`], without persistence.
pub fn test_store() -> (LicenseStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(epoch()));
    let store = LicenseStore::new(test_key())
        .with_device(test_device())
        .with_clock(clock.clone());
    (store, clock)
}

/// A store persisting to `dir/license.bin` without encryption.
pub fn persistent_store(dir: &Path) -> (LicenseStore, Arc<ManualClock>) {
    let (store, clock) = test_store();
    let vault = LicenseVault::new(dir.join("license.bin"), Arc::new(PassthroughEncryptor));
    (store.with_vault(vault), clock)
}
