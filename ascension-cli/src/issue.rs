//! Offline license issuance from command-line input.

use anyhow::{bail, Context, Result};
use ascension_license::{DeviceBinding, LicenseClaims, WILDCARD};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

/// What the operator asked to sign.
#[derive(Debug, Clone, Default)]
pub struct IssueRequest {
    pub subject: Option<String>,
    /// RFC 3339, `YYYY-MM-DD` or a relative `+30d` / `+12h` / `+45m`.
    pub expires: String,
    pub features: Vec<String>,
    pub grace_secs: u64,
    /// Device fingerprint to bind to; unbound when absent.
    pub device: Option<String>,
    pub issuer: Option<String>,
}

impl IssueRequest {
    /// Builds the claims, resolving relative expiry against `now`.
    ///
    /// No features means every feature.
    pub fn claims(&self, now: DateTime<Utc>) -> Result<LicenseClaims> {
        let expires_at = parse_expiry(&self.expires, now)?;

        let features: Vec<&str> = self
            .features
            .iter()
            .flat_map(|f| f.split(','))
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect();
        if let Some(bad) = features.iter().find(|f| f.contains(char::is_whitespace)) {
            bail!("feature '{bad}' contains whitespace; separate features with ','");
        }

        let mut claims = LicenseClaims::new(expires_at)
            .with_grace_seconds(self.grace_secs)
            .with_features(if features.is_empty() { vec![WILDCARD] } else { features });
        if let Some(subject) = self.subject.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            claims = claims.with_subject(subject);
        }
        if let Some(device) = &self.device {
            claims = claims.bound_to(DeviceBinding::from_wire(device));
        }
        if let Some(issuer) = &self.issuer {
            claims = claims.with_issuer(issuer.trim());
        }
        Ok(claims)
    }
}

/// Parses an expiry. A bare date means the end of that day, UTC.
pub fn parse_expiry(text: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let text = text.trim();
    if let Some(relative) = text.strip_prefix('+') {
        return parse_relative(relative)
            .and_then(|d| now.checked_add_signed(d))
            .with_context(|| format!("invalid relative expiry: {text}"));
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Ok(at.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).context("invalid time of day")?;
        return Ok(date.and_time(end_of_day).and_utc());
    }
    bail!("unrecognized expiry '{text}'; use RFC 3339, YYYY-MM-DD or +30d")
}

fn parse_relative(text: &str) -> Option<Duration> {
    let unit = text.chars().last()?;
    let amount: i64 = text[..text.len() - unit.len_utf8()].parse().ok()?;
    if amount <= 0 {
        return None;
    }
    match unit {
        'd' => Duration::try_days(amount),
        'h' => Duration::try_hours(amount),
        'm' => Duration::try_minutes(amount),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn relative_units() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_expiry("+2d", now).unwrap(), now + Duration::days(2));
        assert_eq!(parse_expiry("+3h", now).unwrap(), now + Duration::hours(3));
        assert_eq!(parse_expiry("+15m", now).unwrap(), now + Duration::minutes(15));
        assert!(parse_expiry("+0d", now).is_err());
        assert!(parse_expiry("+5w", now).is_err());
        assert!(parse_expiry("+", now).is_err());
    }
}
