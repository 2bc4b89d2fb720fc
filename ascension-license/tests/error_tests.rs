use ascension_license::LicenseError;

#[test]
fn format_and_payload_errors_share_parse_error_reason() {
    assert_eq!(LicenseError::InvalidKeyFormat("x".into()).reason(), "ParseError");
    assert_eq!(LicenseError::InvalidPayload("y".into()).reason(), "ParseError");
}

#[test]
fn reasons_do_not_leak_detail() {
    let err = LicenseError::InvalidPayload("unknown field admin".into());
    assert!(!err.reason().contains("admin"));
    assert!(!err.reason_code().contains("admin"));
    assert!(format!("{err}").contains("admin"));
}

#[test]
fn reason_codes_are_snake_case() {
    let all = [
        LicenseError::InvalidKeyFormat(String::new()),
        LicenseError::InvalidPayload(String::new()),
        LicenseError::InvalidSignature,
        LicenseError::Expired(String::new()),
        LicenseError::DeviceMismatch,
        LicenseError::SubjectMismatch,
        LicenseError::IssuerMismatch,
        LicenseError::NotActivated,
        LicenseError::FeatureDenied(String::new()),
        LicenseError::TamperDetected,
        LicenseError::Storage(String::new()),
    ];
    for err in all {
        let code = err.reason_code();
        assert!(code.chars().all(|c| c.is_ascii_lowercase() || c == '_'), "{code}");
    }
}

#[test]
fn specific_reason_names() {
    assert_eq!(LicenseError::InvalidSignature.reason(), "InvalidSignature");
    assert_eq!(LicenseError::TamperDetected.reason(), "TamperDetected");
    assert_eq!(LicenseError::NotActivated.reason(), "NoLicense");
    assert_eq!(LicenseError::DeviceMismatch.reason_code(), "device_mismatch");
}

#[test]
fn error_display_expired() {
    let err = LicenseError::Expired("2025-01-01".into());
    assert!(format!("{err}").contains("expired"));
}

#[test]
fn error_display_feature_denied() {
    let err = LicenseError::FeatureDenied("macro.run".into());
    assert!(format!("{err}").contains("macro.run"));
}
