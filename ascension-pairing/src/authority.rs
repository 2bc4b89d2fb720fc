//! Capability issuance and per-request authorization.
//!
//! A caller proves presence with the rolling pairing code and receives a
//! short-lived bearer token limited to a set of scopes. Every gated
//! request presents that token again.
//!
//! Authorization checks run cheapest first: presence, shape, revocation,
//! then the MAC, then expiry and scope. Nothing past the revocation check
//! happens under a lock.

use crate::bearer::parse_bearer;
use crate::capability::{encode_token, CapabilityClaims, TokenSegments};
use crate::error::{CapabilityError, CapabilityResult};
use crate::revocation::RevocationSet;
use crate::window::PairingCodeGenerator;
use ascension_crypto::MacKey;
use ascension_types::{Clock, Nonce};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Default capability `iss`.
pub const DEFAULT_CAPABILITY_ISSUER: &str = "Ascension";

/// Default capability `sub`.
pub const DEFAULT_CAPABILITY_SUBJECT: &str = "module";

/// Default capability lifetime (30 minutes).
pub const DEFAULT_CAPABILITY_TTL_SECS: u64 = 30 * 60;

/// Upper bound on requested lifetimes (24 hours).
pub const MAX_CAPABILITY_TTL_SECS: u64 = 24 * 60 * 60;

/// Scopes granted when a request names none.
pub const DEFAULT_SCOPES: [&str; 3] = ["hud.read", "chat.send", "macro.run"];

/// What the authority stamps into tokens and how long they live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityPolicy {
    pub issuer: String,
    pub subject: String,
    pub default_scopes: BTreeSet<String>,
    pub default_ttl_secs: u64,
    pub max_ttl_secs: u64,
}

impl Default for CapabilityPolicy {
    fn default() -> Self {
        Self {
            issuer: DEFAULT_CAPABILITY_ISSUER.to_string(),
            subject: DEFAULT_CAPABILITY_SUBJECT.to_string(),
            default_scopes: DEFAULT_SCOPES.iter().map(|s| (*s).to_string()).collect(),
            default_ttl_secs: DEFAULT_CAPABILITY_TTL_SECS,
            max_ttl_secs: MAX_CAPABILITY_TTL_SECS,
        }
    }
}

impl CapabilityPolicy {
    /// Resolves a requested lifetime: `None` or zero means the default,
    /// anything above the maximum is clamped.
    #[must_use]
    pub fn effective_ttl_secs(&self, requested: Option<u64>) -> u64 {
        let ttl = match requested {
            Some(secs) if secs > 0 => secs,
            _ => self.default_ttl_secs,
        };
        ttl.min(self.max_ttl_secs).max(1)
    }
}

/// A freshly minted capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCapability {
    pub token: String,
    pub claims: CapabilityClaims,
}

impl IssuedCapability {
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.claims.exp
    }

    #[must_use]
    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.claims.scopes
    }
}

/// Mints, verifies and revokes capability tokens.
#[derive(Debug)]
pub struct CapabilityAuthority {
    mac: MacKey,
    pairing: PairingCodeGenerator,
    revoked: RevocationSet,
    policy: CapabilityPolicy,
}

impl CapabilityAuthority {
    /// Creates an authority signing with `secret`. The clock is shared
    /// with the pairing generator.
    ///
    /// # Errors
    ///
    /// Returns `Crypto` if `secret` cannot key HMAC.
    pub fn new(
        secret: &[u8],
        pairing: PairingCodeGenerator,
        policy: CapabilityPolicy,
    ) -> CapabilityResult<Self> {
        Ok(Self {
            mac: MacKey::new(secret)?,
            pairing,
            revoked: RevocationSet::new(),
            policy,
        })
    }

    #[must_use]
    pub fn pairing(&self) -> &PairingCodeGenerator {
        &self.pairing
    }

    #[must_use]
    pub fn policy(&self) -> &CapabilityPolicy {
        &self.policy
    }

    fn clock(&self) -> &Arc<dyn Clock> {
        self.pairing.clock()
    }

    /// Exchanges a pairing code for a capability.
    ///
    /// Empty or blank `scopes` fall back to the policy defaults.
    ///
    /// # Errors
    ///
    /// `MissingCode` or `StaleWindow` if the code is not accepted.
    pub fn issue<I, S>(
        &self,
        pairing_code: &str,
        scopes: I,
        ttl_secs: Option<u64>,
    ) -> CapabilityResult<IssuedCapability>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Err(e) = self.pairing.check(pairing_code) {
            debug!(reason = e.reason(), "Capability issuance denied");
            return Err(e);
        }

        let mut scopes: BTreeSet<String> = scopes
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if scopes.is_empty() {
            scopes = self.policy.default_scopes.clone();
        }

        let ttl = self.policy.effective_ttl_secs(ttl_secs);
        let now = self.clock().now();
        let claims = CapabilityClaims {
            sub: self.policy.subject.clone(),
            iss: self.policy.issuer.clone(),
            iat: now,
            exp: i64::try_from(ttl)
                .ok()
                .and_then(Duration::try_seconds)
                .and_then(|d| now.checked_add_signed(d))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            scopes,
            nonce: Nonce::new(),
        };
        let token = encode_token(&self.mac, &claims)?;

        info!(
            nonce = %claims.nonce,
            scopes = ?claims.scopes,
            ttl_secs = ttl,
            "Capability issued"
        );
        Ok(IssuedCapability { token, claims })
    }

    /// Verifies a bearer credential and checks it grants `required_scope`.
    ///
    /// Accepts either the raw token or an `Authorization` value with a
    /// `Bearer` prefix.
    ///
    /// # Errors
    ///
    /// The first failing check, in order: `MissingCapability`, `Format`,
    /// `Revoked`, `Signature`, `Expired`, `InsufficientScope`.
    pub fn authorize(
        &self,
        bearer: &str,
        required_scope: &str,
    ) -> CapabilityResult<CapabilityClaims> {
        let result = self.check(bearer, required_scope);
        if let Err(e) = &result {
            debug!(reason = e.reason(), scope = required_scope, "Capability denied");
        }
        result
    }

    fn check(&self, bearer: &str, required_scope: &str) -> CapabilityResult<CapabilityClaims> {
        let token = parse_bearer(bearer).ok_or(CapabilityError::MissingCapability)?;
        let segments = TokenSegments::split(token)?;
        if self.revoked.contains(token) {
            return Err(CapabilityError::Revoked);
        }
        let claims = self.verify_segments(&segments)?;
        if claims.is_expired_at(self.clock().now()) {
            return Err(CapabilityError::Expired);
        }
        if !claims.allows(required_scope) {
            return Err(CapabilityError::InsufficientScope(required_scope.to_string()));
        }
        Ok(claims)
    }

    /// Revokes a token. Idempotent; returns true the first time.
    ///
    /// The `Bearer` prefix is stripped like in [`Self::authorize`]. Only
    /// tokens minted by this authority and not yet expired are recorded;
    /// anything else is already denied and is ignored. Entries for tokens
    /// that have since expired are pruned on every call.
    pub fn revoke(&self, bearer: &str) -> bool {
        let now = self.clock().now();
        let pruned = self.revoked.prune(now);
        if pruned > 0 {
            debug!(pruned, "Expired revocations dropped");
        }

        let Some(token) = parse_bearer(bearer) else {
            return false;
        };
        let claims = match self.authenticate(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(reason = e.reason(), "Ignoring revoke of a token not minted here");
                return false;
            }
        };
        if claims.is_expired_at(now) {
            return false;
        }

        let added = self.revoked.insert(token, claims.exp);
        if added {
            info!(revoked = self.revoked.len(), "Capability revoked");
        }
        added
    }

    /// Number of revocations currently held.
    #[must_use]
    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }

    #[must_use]
    pub fn is_revoked(&self, bearer: &str) -> bool {
        parse_bearer(bearer).is_some_and(|token| self.revoked.contains(token))
    }

    fn authenticate(&self, token: &str) -> CapabilityResult<CapabilityClaims> {
        self.verify_segments(&TokenSegments::split(token)?)
    }

    /// MAC, then claims, then issuer.
    fn verify_segments(&self, segments: &TokenSegments<'_>) -> CapabilityResult<CapabilityClaims> {
        if !segments.verify_mac(&self.mac) {
            return Err(CapabilityError::Signature);
        }
        let claims = segments.decode_claims()?;
        if claims.iss != self.policy.issuer {
            return Err(CapabilityError::Signature);
        }
        Ok(claims)
    }
}
