use anyhow::Result;
use serde::Serialize;

/// Renders a facade response for the terminal.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
