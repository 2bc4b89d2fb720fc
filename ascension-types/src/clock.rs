//! Wall-clock sources.
//!
//! Every time-dependent rule (license expiry, grace, pairing windows,
//! capability lifetimes) asks a `Clock` for the current UTC instant
//! instead of calling `Utc::now()` directly.

use chrono::{DateTime, TimeZone, Utc};
use std::fmt;
use std::sync::RwLock;

/// A source of the current UTC time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current instant as whole seconds since the Unix epoch.
    fn unix_seconds(&self) -> i64 {
        self.now().timestamp()
    }
}

/// The operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Returns the system time as seconds since the Unix epoch.
#[must_use]
pub fn unix_now() -> i64 {
    SystemClock.unix_seconds()
}

/// A clock that only moves when told to.
///
/// Used by tests and by tooling that needs to evaluate a rule "as of"
/// a given instant.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Creates a clock frozen at the given Unix second.
    ///
    /// Out-of-range values fall back to the epoch.
    #[must_use]
    pub fn at_unix(secs: i64) -> Self {
        let now = Utc.timestamp_opt(secs, 0).single().unwrap_or_default();
        Self::new(now)
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        let mut guard = self.now.write().unwrap_or_else(|e| e.into_inner());
        *guard = now;
    }

    /// Moves the clock to the given Unix second.
    pub fn set_unix(&self, secs: i64) {
        if let Some(now) = Utc.timestamp_opt(secs, 0).single() {
            self.set(now);
        }
    }

    /// Advances the clock by `secs` seconds (negative values rewind it).
    pub fn advance_secs(&self, secs: i64) {
        let mut guard = self.now.write().unwrap_or_else(|e| e.into_inner());
        *guard += chrono::Duration::seconds(secs);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}
