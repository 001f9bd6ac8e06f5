//! Text message encryption.

use crate::config::CipherConfig;
use crate::error::{CipherError, CipherResult};
use crate::package::EncryptedPackage;
use chrono::Utc;
use qmail_crypto::{EncryptionEngine, SecurityLevel, encoding};
use qmail_km::{KeyManager, KeyRecord, ManagerStatus};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Key size requested for every level except the one-time pad.
const SESSION_KEY_BITS: u32 = 256;

/// Pairs a key manager with the encryption engine to seal and open
/// [`EncryptedPackage`]s.
#[derive(Clone)]
pub struct MessageCipher {
    key_manager: Arc<dyn KeyManager>,
    engine: EncryptionEngine,
    config: CipherConfig,
}

impl MessageCipher {
    pub fn new(key_manager: Arc<dyn KeyManager>) -> Self {
        Self::with_config(key_manager, CipherConfig::default())
    }

    pub fn with_config(key_manager: Arc<dyn KeyManager>, config: CipherConfig) -> Self {
        Self {
            key_manager,
            engine: EncryptionEngine::new(),
            config,
        }
    }

    pub fn config(&self) -> &CipherConfig {
        &self.config
    }

    pub fn key_manager(&self) -> &Arc<dyn KeyManager> {
        &self.key_manager
    }

    /// Encrypts `text` under a freshly issued key.
    pub async fn encrypt_message(
        &self,
        text: &str,
        level: SecurityLevel,
        recipient_id: Option<&str>,
    ) -> CipherResult<EncryptedPackage> {
        let plaintext = text.as_bytes();
        let bits = key_bits_for(level, plaintext.len())?;
        let key = self.issue_one(bits).await?;

        let (ciphertext, metadata) = self.engine.encrypt(plaintext, key.material(), level)?;
        debug!(
            "encrypted {} bytes at {level} with key {}",
            plaintext.len(),
            key.id()
        );

        Ok(EncryptedPackage {
            ciphertext: encoding::encode(&ciphertext),
            key_id: key.id().to_string(),
            security_level: level,
            security_level_name: level.name().to_string(),
            metadata,
            recipient_id: recipient_id.map(str::to_string),
            timestamp: Utc::now(),
        })
    }

    /// Encrypts with [`CipherConfig::default_level`].
    pub async fn encrypt_with_default_level(
        &self,
        text: &str,
        recipient_id: Option<&str>,
    ) -> CipherResult<EncryptedPackage> {
        self.encrypt_message(text, self.config.default_level, recipient_id)
            .await
    }

    /// Recovers the text sealed in `package`.
    pub async fn decrypt_message(&self, package: &EncryptedPackage) -> CipherResult<String> {
        package.check_consistency()?;

        let ciphertext = encoding::decode(&package.ciphertext)
            .map_err(|e| CipherError::InvalidEncoding(format!("ciphertext: {e}")))?;

        let key = match self.key_manager.fetch_by_id(&package.key_id).await {
            Ok(Some(key)) => key,
            Ok(None) => return Err(CipherError::KeyUnavailable(package.key_id.clone())),
            Err(e) => {
                warn!("key lookup for {} failed: {e}", package.key_id);
                return Err(e.into());
            }
        };

        let plaintext = self
            .engine
            .decrypt(&ciphertext, key.material(), &package.metadata)?;
        debug!(
            "decrypted {} bytes at {} with key {}",
            plaintext.len(),
            package.security_level,
            package.key_id
        );

        String::from_utf8(plaintext).map_err(|e| {
            let at = e.utf8_error().valid_up_to();
            CipherError::CorruptPlaintext(format!("not valid UTF-8 at byte {at}"))
        })
    }

    /// Encrypts and returns the package as pretty-printed JSON.
    pub async fn encrypt_message_to_json(
        &self,
        text: &str,
        level: SecurityLevel,
        recipient_id: Option<&str>,
    ) -> CipherResult<String> {
        self.encrypt_message(text, level, recipient_id)
            .await?
            .to_json()
    }

    pub async fn decrypt_message_from_json(&self, json: &str) -> CipherResult<String> {
        let package = EncryptedPackage::from_json(json)?;
        self.decrypt_message(&package).await
    }

    /// Passes the key manager's status through.
    pub async fn key_manager_status(&self) -> CipherResult<ManagerStatus> {
        Ok(self.key_manager.status().await?)
    }

    async fn issue_one(&self, bits: u32) -> CipherResult<KeyRecord> {
        let mut keys = self.key_manager.issue_keys(bits, 1).await.inspect_err(|e| {
            warn!("key issuance of {bits} bits failed: {e}");
        })?;
        if keys.is_empty() {
            return Err(CipherError::KeyIssuance(
                "key manager returned no keys".to_string(),
            ));
        }
        let key = keys.swap_remove(0);
        info!("using key {} ({} bits)", key.id(), key.bit_size());
        Ok(key)
    }
}

/// A one-time pad needs a key as long as the payload (never below 256 bits).
/// Every other level takes a 256-bit key.
fn key_bits_for(level: SecurityLevel, plaintext_len: usize) -> CipherResult<u32> {
    match level {
        SecurityLevel::QuantumOtp => {
            let bits = u32::try_from(plaintext_len)
                .ok()
                .and_then(|len| len.checked_mul(8))
                .ok_or(CipherError::PayloadTooLarge {
                    size: plaintext_len as u64,
                    max: u64::from(u32::MAX / 8),
                })?;
            Ok(bits.max(SESSION_KEY_BITS))
        }
        SecurityLevel::QuantumAes | SecurityLevel::PostQuantum | SecurityLevel::Classical => {
            Ok(SESSION_KEY_BITS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_key_covers_payload() {
        assert_eq!(key_bits_for(SecurityLevel::QuantumOtp, 0).unwrap(), 256);
        assert_eq!(key_bits_for(SecurityLevel::QuantumOtp, 32).unwrap(), 256);
        assert_eq!(key_bits_for(SecurityLevel::QuantumOtp, 33).unwrap(), 264);
        assert_eq!(key_bits_for(SecurityLevel::QuantumOtp, 1000).unwrap(), 8000);
    }

    #[test]
    fn block_levels_use_session_key() {
        for level in [
            SecurityLevel::QuantumAes,
            SecurityLevel::PostQuantum,
            SecurityLevel::Classical,
        ] {
            assert_eq!(key_bits_for(level, 1_000_000).unwrap(), 256);
        }
    }
}
