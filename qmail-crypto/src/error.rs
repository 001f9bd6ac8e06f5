//! Engine error types.

use thiserror::Error;

/// Result type for engine operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors raised by the encryption engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("key too short: need {required} bytes, got {actual}")]
    KeyTooShort { required: usize, actual: usize },

    #[error("authentication failed (wrong key or tampered data)")]
    AuthenticationFailed,

    #[error("unsupported security level: {0}")]
    UnsupportedLevel(u8),

    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    #[error("invalid algorithm metadata: {0}")]
    InvalidMetadata(String),

    #[error("encryption failed: {0}")]
    Encryption(String),
}
