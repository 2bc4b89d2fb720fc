//! Configuration loading and validation.

use ascension_core::{ConfigError, SecurityConfig};
use ascension_license::TrustedKey;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

#[test]
fn empty_document_yields_defaults() {
    let config = SecurityConfig::from_toml_str("").unwrap();
    assert_eq!(config, SecurityConfig::default());
    assert_eq!(config.issuer, "Ascension");
    assert_eq!(config.pairing.window_secs, 600);
    assert_eq!(config.pairing.word_count, 6);
    assert_eq!(config.pairing.port, 8778);
    assert_eq!(config.tamper.interval_secs, 5);
    assert_eq!(config.status_interval_secs, 300);
}

#[test]
fn parses_sections() {
    let config = SecurityConfig::from_toml_str(
        r#"
        issuer = "Ascension-Test"
        subject = "Valkyrie"
        license_path = "/tmp/ascension/license.bin"

        [pairing]
        window_secs = 300
        port = 9000
        default_scopes = ["hud.read"]

        [tamper]
        enabled = false
        "#,
    )
    .unwrap();

    assert_eq!(config.issuer, "Ascension-Test");
    assert_eq!(config.subject.as_deref(), Some("Valkyrie"));
    assert_eq!(
        config.resolved_license_path(),
        Some(PathBuf::from("/tmp/ascension/license.bin"))
    );
    assert_eq!(config.pairing.window_secs, 300);
    assert_eq!(config.pairing.word_count, 6);
    assert_eq!(config.pairing.port, 9000);
    assert!(!config.tamper.enabled);

    let policy = config.license_policy();
    assert_eq!(policy.issuer, "Ascension-Test");
    assert_eq!(policy.subject.as_deref(), Some("Valkyrie"));

    let capability = config.capability_policy();
    assert_eq!(capability.issuer, "Ascension-Test");
    assert_eq!(capability.default_scopes.len(), 1);
    assert!(capability.default_scopes.contains("hud.read"));
}

#[test]
fn unknown_fields_are_rejected() {
    let err = SecurityConfig::from_toml_str("isuser = \"typo\"").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn out_of_range_values_are_rejected() {
    for text in [
        "issuer = \"  \"",
        "[pairing]\nwindow_secs = 0",
        "[pairing]\nword_count = 0",
        "[pairing]\nword_count = 17",
        "[pairing]\ndefault_scopes = []",
        "[pairing]\ncapability_ttl_secs = 90000",
        "[tamper]\ninterval_secs = 0",
        "status_interval_secs = 0",
    ] {
        let err = SecurityConfig::from_toml_str(text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{text}: {err}");
    }
}

#[test]
fn public_key_override() {
    let pem = include_str!("../../ascension-license/tests/fixtures/test_issuer_pub.pem");
    let config = SecurityConfig::from_toml_str(&format!("public_key = '''\n{pem}'''")).unwrap();
    let key = config.trusted_key().unwrap();
    assert_eq!(key, TrustedKey::parse(pem).unwrap());
    assert_ne!(key, TrustedKey::embedded().unwrap());

    let err = SecurityConfig::from_toml_str("public_key = \"abcd\"").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn embedded_key_is_the_default_trust_root() {
    let config = SecurityConfig::default();
    assert_eq!(config.trusted_key().unwrap(), TrustedKey::embedded().unwrap());
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = SecurityConfig::load_from(&dir.path().join("security.toml")).unwrap();
    assert_eq!(config, SecurityConfig::default());
}

#[test]
fn loads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("security.toml");
    std::fs::write(&path, "subject = \"Valkyrie\"\n[pairing]\nhost = \"0.0.0.0\"\n").unwrap();

    let config = SecurityConfig::load_from(&path).unwrap();
    assert_eq!(config.subject.as_deref(), Some("Valkyrie"));
    assert_eq!(config.pairing.host, "0.0.0.0");
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("security.toml");
    std::fs::write(&path, "issuer = ").unwrap();

    assert!(matches!(
        SecurityConfig::load_from(&path),
        Err(ConfigError::Parse(_))
    ));
}
