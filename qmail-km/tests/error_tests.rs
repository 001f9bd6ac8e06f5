use qmail_km::KmError;

#[test]
fn unavailable_display() {
    let err = KmError::Unavailable("connection refused".into());
    assert_eq!(err.to_string(), "key manager unavailable: connection refused");
}

#[test]
fn invalid_request_display() {
    let err = KmError::InvalidRequest("key size must be positive".into());
    assert_eq!(err.to_string(), "invalid key request: key size must be positive");
}

#[test]
fn storage_display() {
    let err = KmError::Storage("disk full".into());
    assert_eq!(err.to_string(), "key store error: disk full");
}

#[test]
fn config_display() {
    let err = KmError::Config("QKD_KM_PORT is not a port: x".into());
    assert_eq!(
        err.to_string(),
        "invalid configuration: QKD_KM_PORT is not a port: x"
    );
}

#[test]
fn serialization_from_serde() {
    let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: KmError = serde_err.into();
    assert!(err.to_string().starts_with("serialization error:"));
}
