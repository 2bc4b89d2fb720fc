//! Operator tooling for Ascension licensing.
//!
//! The binary wraps these helpers; they are kept in a library so the
//! parsing and issuing rules can be tested without spawning a process.

mod issue;
mod keys;
mod output;

pub use issue::{parse_expiry, IssueRequest};
pub use keys::{load_issuer, write_secret_key};
pub use output::to_pretty_json;
