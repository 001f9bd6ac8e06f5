//! Security-level dispatch for encryption and decryption.
//!
//! The engine is a zero-sized value with no state. Every call borrows the
//! key material it is given and never retains it, so a single engine can be
//! shared freely across threads.

use crate::error::{CryptoError, CryptoResult};
use crate::level::SecurityLevel;
use crate::metadata::AlgorithmMetadata;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use tracing::debug;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES-256 key size in bytes. Longer key material is truncated to this.
pub const AES_KEY_SIZE: usize = 32;

/// AES-CBC initialization vector size in bytes.
pub const IV_SIZE: usize = 16;

/// AES-GCM nonce size in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Stateless dispatcher over the four security levels.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncryptionEngine;

impl EncryptionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Encrypts `plaintext` under `key` at the given level.
    ///
    /// Returns the raw ciphertext and the metadata required to reverse it.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        key: &[u8],
        level: SecurityLevel,
    ) -> CryptoResult<(Vec<u8>, AlgorithmMetadata)> {
        debug!("encrypting {} bytes at level {level}", plaintext.len());

        match level {
            SecurityLevel::QuantumOtp => {
                let ciphertext = xor_pad(plaintext, key)?;
                Ok((
                    ciphertext,
                    AlgorithmMetadata::QuantumOtp {
                        plaintext_length: plaintext.len(),
                    },
                ))
            }
            SecurityLevel::QuantumAes => {
                let aes_key = aes_key(key)?;
                let iv: [u8; IV_SIZE] = random_bytes();
                let ciphertext = Aes256CbcEnc::new_from_slices(aes_key, &iv)
                    .map_err(|e| CryptoError::Encryption(format!("AES-CBC init failed: {e}")))?
                    .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
                Ok((
                    ciphertext,
                    AlgorithmMetadata::QuantumAes {
                        iv,
                        plaintext_length: plaintext.len(),
                    },
                ))
            }
            SecurityLevel::PostQuantum => {
                // The supplied material is the KEM-derived session key.
                let nonce: [u8; NONCE_SIZE] = random_bytes();
                let ciphertext = gcm_seal(plaintext, key, &nonce)?;
                Ok((ciphertext, AlgorithmMetadata::PostQuantum { nonce }))
            }
            SecurityLevel::Classical => {
                let nonce: [u8; NONCE_SIZE] = random_bytes();
                let ciphertext = gcm_seal(plaintext, key, &nonce)?;
                Ok((ciphertext, AlgorithmMetadata::Classical { nonce }))
            }
        }
    }

    /// Reverses [`encrypt`](Self::encrypt). The level is taken from the
    /// metadata.
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        key: &[u8],
        metadata: &AlgorithmMetadata,
    ) -> CryptoResult<Vec<u8>> {
        debug!(
            "decrypting {} bytes at level {}",
            ciphertext.len(),
            metadata.level()
        );

        match metadata {
            AlgorithmMetadata::QuantumOtp { plaintext_length } => {
                let len = *plaintext_length;
                if ciphertext.len() < len {
                    return Err(CryptoError::InvalidCiphertext(format!(
                        "OTP ciphertext holds {} bytes, metadata declares {len}",
                        ciphertext.len()
                    )));
                }
                xor_pad(&ciphertext[..len], key)
            }
            AlgorithmMetadata::QuantumAes {
                iv,
                plaintext_length,
            } => {
                let aes_key = aes_key(key)?;
                let plaintext = Aes256CbcDec::new_from_slices(aes_key, iv)
                    .map_err(|e| CryptoError::Encryption(format!("AES-CBC init failed: {e}")))?
                    .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                    .map_err(|_| {
                        CryptoError::InvalidCiphertext("bad block padding".to_string())
                    })?;
                if plaintext.len() != *plaintext_length {
                    return Err(CryptoError::InvalidCiphertext(format!(
                        "decrypted {} bytes, metadata declares {plaintext_length}",
                        plaintext.len()
                    )));
                }
                Ok(plaintext)
            }
            AlgorithmMetadata::PostQuantum { nonce } | AlgorithmMetadata::Classical { nonce } => {
                gcm_open(ciphertext, key, nonce)
            }
        }
    }
}

/// Byte-for-byte XOR against the leading bytes of the pad.
fn xor_pad(data: &[u8], pad: &[u8]) -> CryptoResult<Vec<u8>> {
    if pad.len() < data.len() {
        return Err(CryptoError::KeyTooShort {
            required: data.len(),
            actual: pad.len(),
        });
    }
    Ok(data.iter().zip(pad).map(|(d, k)| d ^ k).collect())
}

fn aes_key(key: &[u8]) -> CryptoResult<&[u8]> {
    key.get(..AES_KEY_SIZE).ok_or(CryptoError::KeyTooShort {
        required: AES_KEY_SIZE,
        actual: key.len(),
    })
}

fn gcm_seal(plaintext: &[u8], key: &[u8], nonce: &[u8; NONCE_SIZE]) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(aes_key(key)?)
        .map_err(|e| CryptoError::Encryption(format!("AES-GCM init failed: {e}")))?;
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| CryptoError::Encryption(format!("AES-GCM seal failed: {e}")))
}

fn gcm_open(ciphertext: &[u8], key: &[u8], nonce: &[u8; NONCE_SIZE]) -> CryptoResult<Vec<u8>> {
    if ciphertext.len() < TAG_SIZE {
        return Err(CryptoError::AuthenticationFailed);
    }
    let cipher = Aes256Gcm::new_from_slice(aes_key(key)?)
        .map_err(|e| CryptoError::Encryption(format!("AES-GCM init failed: {e}")))?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailed)
}

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes
}
