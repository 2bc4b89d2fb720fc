//! Shared type definitions for the Ascension security core.
//!
//! This crate holds the small, domain-agnostic pieces every other crate
//! leans on:
//! - A `Clock` abstraction so expiry, grace and pairing windows can be
//!   evaluated against an injected "now"
//! - `Nonce`, the uniqueness marker carried by licenses and capabilities

mod clock;
mod ids;

pub use clock::{unix_now, Clock, ManualClock, SystemClock};
pub use ids::Nonce;
