//! Self-describing encrypted payloads and their attachment counterparts.

use crate::error::{CipherError, CipherResult};
use chrono::{DateTime, Utc};
use qmail_crypto::{AlgorithmMetadata, SecurityLevel};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything a recipient needs, besides the key itself, to decrypt a
/// message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPackage {
    /// Ciphertext, base64 encoded.
    pub ciphertext: String,
    pub key_id: String,
    /// Numeric tag on the wire.
    pub security_level: SecurityLevel,
    pub security_level_name: String,
    pub metadata: AlgorithmMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl EncryptedPackage {
    /// Fails with `LevelMismatch` when the declared level and the level the
    /// metadata was produced for disagree, and with `InvalidEncoding` when
    /// `security_level_name` is not the wire name of the declared level.
    pub fn check_consistency(&self) -> CipherResult<()> {
        if self.security_level_name != self.security_level.name() {
            return Err(CipherError::InvalidEncoding(format!(
                "security_level_name {} does not name level {}",
                self.security_level_name,
                self.security_level.name()
            )));
        }
        let embedded = self.metadata.level();
        if embedded != self.security_level {
            return Err(CipherError::LevelMismatch {
                declared: self.security_level,
                embedded,
            });
        }
        Ok(())
    }

    pub fn to_json(&self) -> CipherResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> CipherResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// An encrypted file plus the descriptive fields shown before decryption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedAttachmentPackage {
    pub filename: String,
    pub content_type: String,
    pub original_size: u64,
    /// Length of the encoded ciphertext.
    pub encrypted_size: u64,
    pub package: EncryptedPackage,
}

impl EncryptedAttachmentPackage {
    pub fn key_id(&self) -> &str {
        &self.package.key_id
    }

    pub fn security_level(&self) -> SecurityLevel {
        self.package.security_level
    }
}

/// A decrypted file.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
    pub content_type: String,
    pub size: u64,
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Facts about a file on disk, gathered before encrypting it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentInfo {
    pub filename: String,
    pub size: u64,
    pub content_type: String,
    /// Lowercased, with the leading dot. Empty if the file has none.
    pub extension: String,
    /// Whether the file fits within the configured attachment limit.
    pub can_encrypt: bool,
}
