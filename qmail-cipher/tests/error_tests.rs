use qmail_cipher::CipherError;
use qmail_crypto::{CryptoError, SecurityLevel};
use qmail_km::KmError;

#[test]
fn key_unavailable_display() {
    let err = CipherError::KeyUnavailable("SIM-KEY-00000001-20250101000000".into());
    assert_eq!(
        err.to_string(),
        "key not available: SIM-KEY-00000001-20250101000000"
    );
}

#[test]
fn level_mismatch_display() {
    let err = CipherError::LevelMismatch {
        declared: SecurityLevel::QuantumOtp,
        embedded: SecurityLevel::Classical,
    };
    assert_eq!(
        err.to_string(),
        "package declares level QUANTUM_OTP but metadata is for CLASSICAL"
    );
}

#[test]
fn payload_too_large_display() {
    let err = CipherError::PayloadTooLarge { size: 30, max: 20 };
    assert_eq!(err.to_string(), "payload too large: 30 bytes (max 20)");
}

#[test]
fn level_not_permitted_display() {
    let err = CipherError::LevelNotPermitted(SecurityLevel::QuantumOtp);
    assert_eq!(
        err.to_string(),
        "security level QUANTUM_OTP is not permitted here"
    );
}

#[test]
fn wrapped_errors_are_transparent() {
    let err: CipherError = CryptoError::AuthenticationFailed.into();
    assert_eq!(err.to_string(), CryptoError::AuthenticationFailed.to_string());

    let err: CipherError = KmError::Unavailable("down".into()).into();
    assert_eq!(err.to_string(), "key manager unavailable: down");
}
