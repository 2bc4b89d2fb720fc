use ascension_types::{unix_now, Clock, ManualClock, Nonce, SystemClock};
use chrono::{TimeZone, Utc};
use std::collections::HashSet;

// ── ManualClock ───────────────────────────────────────────────────

#[test]
fn manual_clock_is_frozen() {
    let clock = ManualClock::at_unix(1_700_000_000);
    assert_eq!(clock.unix_seconds(), 1_700_000_000);
    assert_eq!(clock.unix_seconds(), 1_700_000_000);
}

#[test]
fn manual_clock_advance_and_rewind() {
    let clock = ManualClock::at_unix(1_000);
    clock.advance_secs(600);
    assert_eq!(clock.unix_seconds(), 1_600);
    clock.advance_secs(-1_200);
    assert_eq!(clock.unix_seconds(), 400);
}

#[test]
fn manual_clock_set() {
    let clock = ManualClock::at_unix(0);
    let at = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap();
    clock.set(at);
    assert_eq!(clock.now(), at);
    clock.set_unix(42);
    assert_eq!(clock.unix_seconds(), 42);
}

#[test]
fn system_clock_tracks_wall_time() {
    let a = unix_now();
    let b = SystemClock.unix_seconds();
    assert!(b >= a);
    assert!(b - a < 5);
}

// ── Nonce ─────────────────────────────────────────────────────────

#[test]
fn nonce_is_unique() {
    let set: HashSet<Nonce> = (0..256).map(|_| Nonce::new()).collect();
    assert_eq!(set.len(), 256);
}

#[test]
fn nonce_has_no_separators() {
    let nonce = Nonce::new();
    assert_eq!(nonce.as_str().len(), 32);
    assert!(nonce.as_str().chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn nonce_serde_is_transparent() {
    let nonce = Nonce::from_raw("abc123");
    let json = serde_json::to_string(&nonce).unwrap();
    assert_eq!(json, "\"abc123\"");
    let parsed: Nonce = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, nonce);
}

#[test]
fn empty_nonce() {
    assert!(Nonce::from_raw("").is_empty());
    assert!(!Nonce::new().is_empty());
}
