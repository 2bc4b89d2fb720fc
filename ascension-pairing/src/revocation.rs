//! In-memory revocation set.
//!
//! Entries live for the process lifetime at most. Each one remembers the
//! token's own expiry and is pruned once that passes, since an expired
//! token is denied regardless.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// Raw token strings that must be rejected, keyed to their expiry.
#[derive(Debug, Default)]
pub struct RevocationSet {
    entries: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl RevocationSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `token`, kept until `expires_at`. Returns true if it was not
    /// already revoked.
    pub fn insert(&self, token: &str, expires_at: DateTime<Utc>) -> bool {
        self.entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(token.to_string(), expires_at)
            .is_none()
    }

    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains_key(token)
    }

    /// Drops entries whose token expired at or before `now`. Returns how
    /// many were removed.
    pub fn prune(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at > now);
        before - entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn prune_drops_only_expired_entries() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let set = RevocationSet::new();
        assert!(set.insert("old", now - Duration::seconds(1)));
        assert!(set.insert("edge", now));
        assert!(set.insert("live", now + Duration::seconds(60)));
        assert!(!set.insert("live", now + Duration::seconds(60)));

        assert_eq!(set.prune(now), 2);
        assert!(set.contains("live"));
        assert!(!set.contains("old"));
        assert_eq!(set.len(), 1);
    }
}
