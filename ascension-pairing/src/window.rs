//! Rolling pairing codes.
//!
//! `window = floor(unix_seconds / window_secs)` and
//! `code = words(HMAC-SHA256(seed, window as little-endian i64))`. Each
//! word comes from one big-endian 16-bit chunk of the digest. A code is
//! accepted during its own window and the one after it, never earlier
//! and never later.

use crate::error::{CapabilityError, CapabilityResult};
use crate::words::WORD_LIST;
use ascension_crypto::{constant_time_eq, MacKey, MAC_SIZE};
use ascension_types::Clock;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

/// Default window length (10 minutes).
pub const DEFAULT_WINDOW_SECS: u64 = 600;

/// Default number of words per code.
pub const DEFAULT_WORD_COUNT: usize = 6;

/// Two digest bytes per word.
const MAX_WORD_COUNT: usize = MAC_SIZE / 2;

/// Derives and checks pairing codes from a fixed seed.
#[derive(Debug)]
pub struct PairingCodeGenerator {
    seed: MacKey,
    window_secs: i64,
    word_count: usize,
    clock: Arc<dyn Clock>,
}

impl PairingCodeGenerator {
    /// Creates a generator with the default window and word count.
    ///
    /// # Errors
    ///
    /// Returns `Crypto` if the seed cannot key HMAC.
    pub fn new(seed: &[u8], clock: Arc<dyn Clock>) -> CapabilityResult<Self> {
        Ok(Self {
            seed: MacKey::new(seed)?,
            window_secs: DEFAULT_WINDOW_SECS as i64,
            word_count: DEFAULT_WORD_COUNT,
            clock,
        })
    }

    /// Sets the window length; zero is treated as one second.
    #[must_use]
    pub fn with_window_secs(mut self, secs: u64) -> Self {
        self.window_secs = i64::try_from(secs.max(1)).unwrap_or(i64::MAX);
        self
    }

    /// Sets the number of words, between 1 and 16.
    #[must_use]
    pub fn with_word_count(mut self, count: usize) -> Self {
        self.word_count = count.clamp(1, MAX_WORD_COUNT);
        self
    }

    #[must_use]
    pub fn window_secs(&self) -> u64 {
        self.window_secs.unsigned_abs()
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        self.word_count
    }

    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Window index containing `unix_seconds`.
    #[must_use]
    pub fn window_at(&self, unix_seconds: i64) -> i64 {
        unix_seconds.div_euclid(self.window_secs)
    }

    #[must_use]
    pub fn current_window(&self) -> i64 {
        self.window_at(self.clock.unix_seconds())
    }

    /// Derives the code for `window`.
    #[must_use]
    pub fn code_for_window(&self, window: i64) -> String {
        let digest = self.seed.compute(&window.to_le_bytes());
        digest
            .chunks_exact(2)
            .take(self.word_count)
            .map(|chunk| {
                let value = u16::from_be_bytes([chunk[0], chunk[1]]) as usize;
                WORD_LIST[value % WORD_LIST.len()]
            })
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Code for the current window.
    #[must_use]
    pub fn current_code(&self) -> String {
        self.code_for_window(self.current_window())
    }

    /// When the current window ends.
    #[must_use]
    pub fn window_expires_at(&self) -> DateTime<Utc> {
        let end = self
            .current_window()
            .saturating_add(1)
            .saturating_mul(self.window_secs);
        Utc.timestamp_opt(end, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// True if `code` belongs to the current or the previous window.
    #[must_use]
    pub fn is_current_or_previous(&self, code: &str) -> bool {
        self.is_current_or_previous_at(code, self.current_window())
    }

    /// True if `code` belongs to `window` or `window - 1`.
    ///
    /// Both candidates are always compared so timing does not reveal
    /// which one matched.
    #[must_use]
    pub fn is_current_or_previous_at(&self, code: &str, window: i64) -> bool {
        let presented = normalize_code(code);
        let current = self.code_for_window(window);
        let previous = self.code_for_window(window.saturating_sub(1));
        let matches_current = constant_time_eq(presented.as_bytes(), current.as_bytes());
        let matches_previous = constant_time_eq(presented.as_bytes(), previous.as_bytes());
        matches_current | matches_previous
    }

    /// Checks a presented code.
    ///
    /// # Errors
    ///
    /// `MissingCode` for blank input, `StaleWindow` for anything else that
    /// is not accepted.
    pub fn check(&self, code: &str) -> CapabilityResult<()> {
        if code.trim().is_empty() {
            return Err(CapabilityError::MissingCode);
        }
        if self.is_current_or_previous(code) {
            Ok(())
        } else {
            Err(CapabilityError::StaleWindow)
        }
    }
}

/// Lowercases and joins words with `-`, accepting spaces and underscores
/// as separators.
#[must_use]
pub fn normalize_code(input: &str) -> String {
    input
        .trim()
        .to_lowercase()
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
