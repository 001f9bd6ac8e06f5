//! Cipher error types.

use qmail_crypto::{CryptoError, SecurityLevel};
use qmail_km::KmError;
use thiserror::Error;

/// Result type for message and attachment operations.
pub type CipherResult<T> = Result<T, CipherError>;

/// Errors surfaced by [`MessageCipher`](crate::MessageCipher) and
/// [`AttachmentCipher`](crate::AttachmentCipher).
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("key not available: {0}")]
    KeyUnavailable(String),

    #[error("decrypted payload is corrupt: {0}")]
    CorruptPlaintext(String),

    #[error("package declares level {declared} but metadata is for {embedded}")]
    LevelMismatch {
        declared: SecurityLevel,
        embedded: SecurityLevel,
    },

    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: u64, max: u64 },

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("key issuance failed: {0}")]
    KeyIssuance(String),

    #[error("security level {0} is not permitted here")]
    LevelNotPermitted(SecurityLevel),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    KeyManager(#[from] KmError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
