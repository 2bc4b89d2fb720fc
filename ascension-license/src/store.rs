//! The license store: apply, persist, reload and evaluate.
//!
//! The active license sits behind an `RwLock<Option<Arc<_>>>`. Writers
//! build a fully verified entry first and swap the pointer in one step;
//! readers clone the `Arc` under the lock and evaluate off-lock, so no
//! reader ever sees a half-applied license. Apply, reload, clear and
//! subject changes also hold one writer mutex from verification through
//! persistence and the swap, so memory and disk always agree on which
//! license is current.
//!
//! Temporal state is never stored. `Valid`, `ExpiredInGrace` and
//! `Expired` are computed from the clock on every query. `TamperLocked`
//! is a one-way flag for the process lifetime.

use crate::claims::{LicenseClaims, LicenseState};
use crate::device::DeviceFingerprint;
use crate::error::{LicenseError, LicenseResult};
use crate::signature::TrustedKey;
use crate::token::{LicenseToken, TokenFormat};
use crate::vault::LicenseVault;
use ascension_types::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, error, info, warn};

/// Default expected issuer.
pub const DEFAULT_ISSUER: &str = "Ascension";

/// Identity checks applied on top of the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicensePolicy {
    /// Required when a license carries `iss`.
    pub issuer: String,
    /// Current bound identity, compared case-insensitively. A license
    /// that names a subject is rejected while this is unknown.
    pub subject: Option<String>,
}

impl Default for LicensePolicy {
    fn default() -> Self {
        Self {
            issuer: DEFAULT_ISSUER.to_string(),
            subject: None,
        }
    }
}

/// A read-only view of the active license at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseSnapshot {
    pub claims: LicenseClaims,
    pub state: LicenseState,
    pub format: TokenFormat,
    pub evaluated_at: DateTime<Utc>,
}

impl LicenseSnapshot {
    /// Seconds until expiry (negative once expired).
    #[must_use]
    pub fn seconds_until_expiry(&self) -> i64 {
        (self.claims.expires_at - self.evaluated_at).num_seconds()
    }

    /// Seconds of grace left; zero before expiry and after grace.
    #[must_use]
    pub fn grace_seconds_left(&self) -> i64 {
        match self.state {
            LicenseState::ExpiredInGrace => {
                (self.claims.grace_ends_at() - self.evaluated_at).num_seconds().max(0)
            }
            _ => 0,
        }
    }

    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.state.is_usable()
    }
}

#[derive(Debug)]
struct ActiveLicense {
    token: LicenseToken,
    claims: LicenseClaims,
}

/// Owner of the active license and the tamper lock.
pub struct LicenseStore {
    trusted_key: TrustedKey,
    device: DeviceFingerprint,
    clock: Arc<dyn Clock>,
    vault: Option<LicenseVault>,
    policy: RwLock<LicensePolicy>,
    active: RwLock<Option<Arc<ActiveLicense>>>,
    writer: Mutex<()>,
    tamper_locked: AtomicBool,
}

impl std::fmt::Debug for LicenseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseStore")
            .field("device", &self.device)
            .field("vault", &self.vault)
            .field("tamper_locked", &self.is_tamper_locked())
            .finish_non_exhaustive()
    }
}

impl LicenseStore {
    /// Creates an empty store for this device with no persistence.
    #[must_use]
    pub fn new(trusted_key: TrustedKey) -> Self {
        Self {
            trusted_key,
            device: DeviceFingerprint::generate(),
            clock: Arc::new(SystemClock),
            vault: None,
            policy: RwLock::new(LicensePolicy::default()),
            active: RwLock::new(None),
            writer: Mutex::new(()),
            tamper_locked: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_device(mut self, device: DeviceFingerprint) -> Self {
        self.device = device;
        self
    }

    #[must_use]
    pub fn with_vault(mut self, vault: LicenseVault) -> Self {
        self.vault = Some(vault);
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: LicensePolicy) -> Self {
        self.policy = RwLock::new(policy);
        self
    }

    #[must_use]
    pub fn device(&self) -> &DeviceFingerprint {
        &self.device
    }

    #[must_use]
    pub fn vault(&self) -> Option<&LicenseVault> {
        self.vault.as_ref()
    }

    /// Current bound identity.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        read_lock(&self.policy).subject.clone()
    }

    /// Changes the current bound identity and re-evaluates the license
    /// against it.
    ///
    /// An active license bound to someone else is dropped from memory,
    /// and the persisted license is re-read in its place. A persisted
    /// license bound to another subject stays on disk.
    ///
    /// # Errors
    ///
    /// `TamperDetected` when locked, or why no license fits the new
    /// subject. `Ok(None)` means there is simply no license.
    pub fn set_subject(&self, subject: Option<String>) -> LicenseResult<Option<LicenseSnapshot>> {
        let _writer = lock(&self.writer);
        write_lock(&self.policy).subject = subject;
        self.ensure_unlocked()?;

        if let Some(active) = self.current() {
            match self.check_identity(&active.claims) {
                Ok(()) => return Ok(Some(self.snapshot_of(&active))),
                Err(e) => {
                    info!(reason = e.reason(), "Active license does not fit the new subject");
                    *write_lock(&self.active) = None;
                    if self.vault.is_none() {
                        return Err(e);
                    }
                }
            }
        }
        self.reload_locked()
    }

    /// Verifies and activates a license from wire text, then persists it.
    ///
    /// A correctly signed license past its expiry is still accepted; its
    /// state shows up in [`Self::is_valid_now`]. On failure the previous
    /// license stays active.
    ///
    /// # Errors
    ///
    /// `TamperDetected` when locked, otherwise whatever decoding or
    /// verification rejects.
    pub fn apply(&self, wire: &str) -> LicenseResult<LicenseSnapshot> {
        self.ensure_unlocked()?;

        let token = LicenseToken::parse(wire).inspect_err(|e| {
            debug!(reason = e.reason(), "License rejected");
        })?;

        let _writer = lock(&self.writer);
        self.ensure_unlocked()?;
        let claims = self.verify_token(&token)?;

        if let Some(vault) = &self.vault {
            if let Err(e) = vault.save(&token.persisted_bytes()) {
                warn!(error = %e, "License accepted but could not be persisted");
            }
        }

        let snapshot = self.activate(token, claims);
        info!(
            subject = snapshot.claims.subject.as_deref().unwrap_or("*"),
            expires_at = %snapshot.claims.expires_at,
            state = %snapshot.state,
            "License accepted"
        );
        Ok(snapshot)
    }

    /// Re-reads the persisted license and re-runs verification.
    ///
    /// Returns `Ok(None)` when there is no vault or no stored file. A
    /// stored license that no longer verifies is cleared; one bound to
    /// another subject is only deactivated.
    ///
    /// # Errors
    ///
    /// `TamperDetected` when locked, `Storage` on read failure, or the
    /// verification error of the stored license.
    pub fn reload(&self) -> LicenseResult<Option<LicenseSnapshot>> {
        let _writer = lock(&self.writer);
        self.reload_locked()
    }

    fn reload_locked(&self) -> LicenseResult<Option<LicenseSnapshot>> {
        self.ensure_unlocked()?;

        let Some(vault) = &self.vault else {
            return Ok(None);
        };
        let Some(bytes) = vault.load()? else {
            debug!("No persisted license");
            return Ok(None);
        };

        let verified = LicenseToken::from_persisted(&bytes)
            .and_then(|token| self.verify_token(&token).map(|claims| (token, claims)));

        match verified {
            Ok((token, claims)) => {
                let snapshot = self.activate(token, claims);
                info!(state = %snapshot.state, "Persisted license loaded");
                Ok(Some(snapshot))
            }
            Err(LicenseError::SubjectMismatch) => {
                info!("Persisted license is bound to another subject");
                *write_lock(&self.active) = None;
                Err(LicenseError::SubjectMismatch)
            }
            Err(e) => {
                warn!(reason = e.reason(), "Persisted license failed verification; clearing");
                *write_lock(&self.active) = None;
                if let Err(clear_err) = vault.clear() {
                    warn!(error = %clear_err, "Could not delete persisted license");
                }
                Err(e)
            }
        }
    }

    /// Drops the active license and deletes the persisted file.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the file cannot be removed. The in-memory
    /// license is dropped either way.
    pub fn clear(&self) -> LicenseResult<()> {
        let _writer = lock(&self.writer);
        *write_lock(&self.active) = None;
        info!("License cleared");
        match &self.vault {
            Some(vault) => vault.clear(),
            None => Ok(()),
        }
    }

    /// `(usable, state)` at the current instant.
    #[must_use]
    pub fn is_valid_now(&self) -> (bool, LicenseState) {
        let state = self.state();
        (state.is_usable(), state)
    }

    /// Current license state.
    #[must_use]
    pub fn state(&self) -> LicenseState {
        if self.is_tamper_locked() {
            return LicenseState::TamperLocked;
        }
        match self.current() {
            Some(active) => active.claims.state_at(self.clock.now()),
            None => LicenseState::Unset,
        }
    }

    /// Snapshot of the active license, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<LicenseSnapshot> {
        let active = self.current()?;
        Some(self.snapshot_of(&active))
    }

    /// Returns true if `feature` may be used right now.
    #[must_use]
    pub fn feature_allowed(&self, feature: &str) -> bool {
        self.check_feature(feature).is_ok()
    }

    /// Checks `feature` and returns the snapshot it was decided on.
    ///
    /// # Errors
    ///
    /// `TamperDetected`, `NotActivated`, `Expired` or `FeatureDenied`.
    pub fn check_feature(&self, feature: &str) -> LicenseResult<LicenseSnapshot> {
        self.ensure_unlocked()?;
        let snapshot = self.snapshot().ok_or(LicenseError::NotActivated)?;
        match snapshot.state {
            LicenseState::Valid | LicenseState::ExpiredInGrace => {}
            _ => {
                return Err(LicenseError::Expired(
                    snapshot.claims.expires_at.to_rfc3339(),
                ));
            }
        }
        if !snapshot.claims.allows(feature) {
            return Err(LicenseError::FeatureDenied(feature.to_string()));
        }
        Ok(snapshot)
    }

    /// Locks licensing for the rest of the process. Returns true on the
    /// first call.
    pub fn tamper_lock(&self) -> bool {
        let first = !self.tamper_locked.swap(true, Ordering::SeqCst);
        if first {
            error!("Tamper detected; licensing locked");
        }
        first
    }

    #[must_use]
    pub fn is_tamper_locked(&self) -> bool {
        self.tamper_locked.load(Ordering::SeqCst)
    }

    fn ensure_unlocked(&self) -> LicenseResult<()> {
        if self.is_tamper_locked() {
            Err(LicenseError::TamperDetected)
        } else {
            Ok(())
        }
    }

    fn verify_token(&self, token: &LicenseToken) -> LicenseResult<LicenseClaims> {
        let result = token
            .verify(&self.trusted_key)
            .and_then(|()| token.claims())
            .and_then(|claims| self.check_identity(&claims).map(|()| claims));
        if let Err(e) = &result {
            debug!(reason = e.reason(), "License rejected");
        }
        result
    }

    fn check_identity(&self, claims: &LicenseClaims) -> LicenseResult<()> {
        let policy = read_lock(&self.policy).clone();

        if let Some(issuer) = &claims.issuer {
            if issuer != &policy.issuer {
                return Err(LicenseError::IssuerMismatch);
            }
        }
        if !claims.device.permits(&self.device) {
            return Err(LicenseError::DeviceMismatch);
        }
        if let Some(bound) = &claims.subject {
            match &policy.subject {
                Some(current) if bound.eq_ignore_ascii_case(current) => {}
                _ => return Err(LicenseError::SubjectMismatch),
            }
        }
        Ok(())
    }

    fn activate(&self, token: LicenseToken, claims: LicenseClaims) -> LicenseSnapshot {
        let active = Arc::new(ActiveLicense { token, claims });
        *write_lock(&self.active) = Some(Arc::clone(&active));
        self.snapshot_of(&active)
    }

    fn current(&self) -> Option<Arc<ActiveLicense>> {
        read_lock(&self.active).clone()
    }

    fn snapshot_of(&self, active: &ActiveLicense) -> LicenseSnapshot {
        let now = self.clock.now();
        let state = if self.is_tamper_locked() {
            LicenseState::TamperLocked
        } else {
            active.claims.state_at(now)
        };
        LicenseSnapshot {
            claims: active.claims.clone(),
            state,
            format: active.token.format(),
            evaluated_at: now,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(std::sync::PoisonError::into_inner)
}
