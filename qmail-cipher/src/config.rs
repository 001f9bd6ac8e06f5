//! Cipher configuration.

use crate::error::{CipherError, CipherResult};
use qmail_crypto::SecurityLevel;
use serde::{Deserialize, Serialize};

const MIB: u64 = 1024 * 1024;

/// Settings for message and attachment encryption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherConfig {
    /// Level used by `encrypt_with_default_level`.
    pub default_level: SecurityLevel,

    /// Largest attachment accepted, in bytes.
    pub max_attachment_size: u64,

    /// Whether attachments may be sealed with a one-time pad. OTP keys are
    /// as long as the payload, so large files consume a lot of key material.
    pub allow_otp_attachments: bool,
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            default_level: SecurityLevel::QuantumAes,
            max_attachment_size: 25 * MIB,
            allow_otp_attachments: true,
        }
    }
}

impl CipherConfig {
    pub fn from_env() -> CipherResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads `DEFAULT_SECURITY_LEVEL` (tag or name), `MAX_EMAIL_SIZE` (MiB)
    /// and `QMAIL_ALLOW_OTP_ATTACHMENTS` through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CipherResult<Self> {
        let defaults = Self::default();

        let default_level = match lookup("DEFAULT_SECURITY_LEVEL") {
            Some(v) => v
                .parse::<SecurityLevel>()
                .map_err(|e| CipherError::Config(format!("DEFAULT_SECURITY_LEVEL: {e}")))?,
            None => defaults.default_level,
        };

        let max_attachment_size = match lookup("MAX_EMAIL_SIZE") {
            Some(v) => {
                let mib: u64 = v.trim().parse().map_err(|_| {
                    CipherError::Config(format!("MAX_EMAIL_SIZE is not a size in MiB: {v}"))
                })?;
                mib.checked_mul(MIB).ok_or_else(|| {
                    CipherError::Config(format!("MAX_EMAIL_SIZE out of range: {v}"))
                })?
            }
            None => defaults.max_attachment_size,
        };

        let allow_otp_attachments = lookup("QMAIL_ALLOW_OTP_ATTACHMENTS")
            .map(|v| !v.trim().eq_ignore_ascii_case("false"))
            .unwrap_or(defaults.allow_otp_attachments);

        Ok(Self {
            default_level,
            max_attachment_size,
            allow_otp_attachments,
        })
    }
}
