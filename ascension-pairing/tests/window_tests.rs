mod common;

use ascension_pairing::{normalize_code, CapabilityError, PairingCodeGenerator};
use ascension_types::ManualClock;
use common::{generator_at, PAIRING_SEED, WINDOW_START};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[test]
fn known_codes_for_fixed_seed() {
    let (generator, _) = generator_at(0);
    assert_eq!(
        generator.code_for_window(0),
        "lambda-glint-aurora-nebula-cipher-spire"
    );
    assert_eq!(generator.code_for_window(1), "nova-ember-jolt-crux-matrix-beacon");
    assert_eq!(
        generator.code_for_window(-1),
        "oracle-sable-matrix-pulsar-inferno-crux"
    );
    assert_eq!(
        generator.code_for_window(2_833_333),
        "matrix-xenon-axiom-titan-cipher-relay"
    );
}

#[test]
fn current_code_tracks_the_window() {
    let (generator, clock) = generator_at(WINDOW_START);
    assert_eq!(generator.current_window(), 2_833_333);
    assert_eq!(generator.current_code(), "matrix-xenon-axiom-titan-cipher-relay");
    clock.set_unix(WINDOW_START + 599);
    assert_eq!(generator.current_window(), 2_833_333);
    clock.set_unix(WINDOW_START + 600);
    assert_eq!(generator.current_window(), 2_833_334);
}

#[test]
fn code_accepted_in_own_and_next_window_only() {
    let (generator, clock) = generator_at(WINDOW_START);
    let code = generator.current_code();
    assert!(generator.is_current_or_previous(&code));

    clock.set_unix(WINDOW_START + 600);
    assert!(generator.is_current_or_previous(&code));

    clock.set_unix(WINDOW_START + 1200);
    assert!(!generator.is_current_or_previous(&code));
    assert_eq!(generator.check(&code).unwrap_err(), CapabilityError::StaleWindow);
}

#[test]
fn code_from_two_windows_back_is_stale() {
    let (generator, _) = generator_at(WINDOW_START + 600);
    let older = generator.code_for_window(2_833_333 - 1);
    assert_eq!(generator.check(&older).unwrap_err(), CapabilityError::StaleWindow);
}

#[test]
fn future_code_is_rejected() {
    let (generator, _) = generator_at(WINDOW_START);
    let future = generator.code_for_window(2_833_334);
    assert!(!generator.is_current_or_previous(&future));
}

#[test]
fn comparison_ignores_case_and_separators() {
    let (generator, _) = generator_at(WINDOW_START);
    let code = generator.current_code();
    assert!(generator.is_current_or_previous(&code.to_uppercase()));
    assert!(generator.is_current_or_previous(&code.replace('-', " ")));
    assert!(generator.is_current_or_previous(&format!("  {}  ", code.replace('-', "_"))));
    assert_eq!(normalize_code(&code.to_uppercase()), code);
}

#[test]
fn partial_code_is_rejected() {
    let (generator, _) = generator_at(WINDOW_START);
    let code = generator.current_code();
    let partial = code.rsplit_once('-').unwrap().0;
    assert!(!generator.is_current_or_previous(partial));
}

#[test]
fn blank_code_is_missing() {
    let (generator, _) = generator_at(WINDOW_START);
    assert_eq!(generator.check("   ").unwrap_err(), CapabilityError::MissingCode);
}

#[test]
fn different_seed_gives_different_codes() {
    let clock = Arc::new(ManualClock::at_unix(WINDOW_START));
    let other = PairingCodeGenerator::new(b"another seed", clock).unwrap();
    let (generator, _) = generator_at(WINDOW_START);
    assert_ne!(other.current_code(), generator.current_code());
    assert!(!generator.is_current_or_previous(&other.current_code()));
}

#[test]
fn window_length_and_word_count_are_configurable() {
    let clock = Arc::new(ManualClock::at_unix(1_000));
    let generator = PairingCodeGenerator::new(PAIRING_SEED, clock)
        .unwrap()
        .with_window_secs(60)
        .with_word_count(4);
    assert_eq!(generator.current_window(), 16);
    assert_eq!(generator.current_code().split('-').count(), 4);
    assert_eq!(generator.window_expires_at().timestamp(), 1_020);
}

#[test]
fn word_count_is_clamped() {
    let (generator, _) = generator_at(0);
    assert_eq!(generator.with_word_count(0).word_count(), 1);
    let (generator, _) = generator_at(0);
    assert_eq!(generator.with_word_count(100).word_count(), 16);
}

#[test]
fn window_expiry_is_end_of_current_window() {
    let (generator, _) = generator_at(WINDOW_START + 17);
    assert_eq!(generator.window_expires_at().timestamp(), WINDOW_START + 600);
}
