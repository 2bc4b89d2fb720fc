//! Shared test helpers for pairing tests.

#![allow(dead_code)]

use ascension_pairing::{CapabilityAuthority, CapabilityPolicy, PairingCodeGenerator};
use ascension_types::ManualClock;
use std::sync::Arc;

pub const PAIRING_SEED: &[u8; 32] = b"ascension-test-pairing-seed-0001";
pub const SERVER_KEY: &[u8; 32] = b"ascension-test-capability-key-01";

/// Start of window 2_833_333 with the default 600s window.
pub const WINDOW_START: i64 = 2_833_333 * 600;

pub fn generator_at(unix: i64) -> (PairingCodeGenerator, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::at_unix(unix));
    let generator = PairingCodeGenerator::new(PAIRING_SEED, clock.clone()).unwrap();
    (generator, clock)
}

pub fn authority_at(unix: i64) -> (CapabilityAuthority, Arc<ManualClock>) {
    let (generator, clock) = generator_at(unix);
    let authority =
        CapabilityAuthority::new(SERVER_KEY, generator, CapabilityPolicy::default()).unwrap();
    (authority, clock)
}
