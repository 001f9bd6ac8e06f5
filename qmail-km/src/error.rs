//! Key manager error types.

use thiserror::Error;

/// Result type for key manager operations.
pub type KmResult<T> = Result<T, KmError>;

/// Errors that can occur while talking to a key manager.
///
/// A key that does not exist is not an error: lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum KmError {
    #[error("key manager unavailable: {0}")]
    Unavailable(String),

    #[error("invalid key request: {0}")]
    InvalidRequest(String),

    #[error("key store error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for KmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            KmError::Unavailable(format!("request timed out: {e}"))
        } else {
            KmError::Unavailable(e.to_string())
        }
    }
}
