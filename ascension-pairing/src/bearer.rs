//! `Authorization` header parsing.

const BEARER_SCHEME: &str = "bearer";

/// Extracts the credential from an `Authorization` value.
///
/// The `Bearer ` prefix is optional and case-insensitive. Returns `None`
/// when nothing is left.
#[must_use]
pub fn parse_bearer(value: &str) -> Option<&str> {
    let value = value.trim();
    let credential = match (
        value.get(..BEARER_SCHEME.len()),
        value.get(BEARER_SCHEME.len()..),
    ) {
        (Some(scheme), Some(rest))
            if scheme.eq_ignore_ascii_case(BEARER_SCHEME)
                && rest.chars().next().is_none_or(char::is_whitespace) =>
        {
            rest.trim()
        }
        _ => value,
    };
    (!credential.is_empty()).then_some(credential)
}
