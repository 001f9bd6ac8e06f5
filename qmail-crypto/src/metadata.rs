//! Per-algorithm metadata produced by encryption and consumed by decryption.

use crate::encoding;
use crate::engine::{IV_SIZE, NONCE_SIZE};
use crate::error::{CryptoError, CryptoResult};
use crate::level::SecurityLevel;
use serde::{Deserialize, Serialize};

const OTP_LABEL: &str = "OTP";
const AES_CBC_LABEL: &str = "AES-256-CBC";
const PQC_GCM_LABEL: &str = "PQC-AES-256-GCM";
const AES_GCM_LABEL: &str = "AES-256-GCM";

/// Everything besides the key that decryption needs.
///
/// In memory this is a tagged union, so an IV can never be read as a nonce.
/// On the wire it is a flat object with an explicit `security_level` tag and
/// an `algorithm` label, plus the variant's own fields (binary ones base64
/// encoded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireMetadata", into = "WireMetadata")]
pub enum AlgorithmMetadata {
    QuantumOtp { plaintext_length: usize },
    QuantumAes { iv: [u8; IV_SIZE], plaintext_length: usize },
    PostQuantum { nonce: [u8; NONCE_SIZE] },
    Classical { nonce: [u8; NONCE_SIZE] },
}

impl AlgorithmMetadata {
    /// The level this metadata was produced under.
    pub fn level(&self) -> SecurityLevel {
        match self {
            AlgorithmMetadata::QuantumOtp { .. } => SecurityLevel::QuantumOtp,
            AlgorithmMetadata::QuantumAes { .. } => SecurityLevel::QuantumAes,
            AlgorithmMetadata::PostQuantum { .. } => SecurityLevel::PostQuantum,
            AlgorithmMetadata::Classical { .. } => SecurityLevel::Classical,
        }
    }

    /// Human-readable algorithm label.
    pub fn algorithm(&self) -> &'static str {
        algorithm_label(self.level())
    }

    /// Declared plaintext length, when the variant records one.
    pub fn plaintext_length(&self) -> Option<usize> {
        match self {
            AlgorithmMetadata::QuantumOtp { plaintext_length }
            | AlgorithmMetadata::QuantumAes {
                plaintext_length, ..
            } => Some(*plaintext_length),
            AlgorithmMetadata::PostQuantum { .. } | AlgorithmMetadata::Classical { .. } => None,
        }
    }
}

fn algorithm_label(level: SecurityLevel) -> &'static str {
    match level {
        SecurityLevel::QuantumOtp => OTP_LABEL,
        SecurityLevel::QuantumAes => AES_CBC_LABEL,
        SecurityLevel::PostQuantum => PQC_GCM_LABEL,
        SecurityLevel::Classical => AES_GCM_LABEL,
    }
}

#[derive(Serialize, Deserialize)]
struct WireMetadata {
    security_level: u8,
    algorithm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plaintext_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nonce: Option<String>,
}

impl From<AlgorithmMetadata> for WireMetadata {
    fn from(meta: AlgorithmMetadata) -> Self {
        let mut wire = WireMetadata {
            security_level: meta.level().tag(),
            algorithm: meta.algorithm().to_string(),
            plaintext_length: meta.plaintext_length(),
            iv: None,
            nonce: None,
        };
        match meta {
            AlgorithmMetadata::QuantumAes { iv, .. } => wire.iv = Some(encoding::encode(&iv)),
            AlgorithmMetadata::PostQuantum { nonce } | AlgorithmMetadata::Classical { nonce } => {
                wire.nonce = Some(encoding::encode(&nonce))
            }
            AlgorithmMetadata::QuantumOtp { .. } => {}
        }
        wire
    }
}

impl TryFrom<WireMetadata> for AlgorithmMetadata {
    type Error = CryptoError;

    fn try_from(wire: WireMetadata) -> CryptoResult<Self> {
        let level = SecurityLevel::from_tag(wire.security_level)?;
        let expected = algorithm_label(level);
        if wire.algorithm != expected {
            return Err(CryptoError::InvalidMetadata(format!(
                "algorithm {} does not belong to level {level} (expected {expected})",
                wire.algorithm
            )));
        }

        let plaintext_length = || {
            wire.plaintext_length.ok_or_else(|| {
                CryptoError::InvalidMetadata(format!("{level} metadata missing plaintext_length"))
            })
        };
        let nonce = || -> CryptoResult<[u8; NONCE_SIZE]> {
            let text = wire.nonce.as_deref().ok_or_else(|| {
                CryptoError::InvalidMetadata(format!("{level} metadata missing nonce"))
            })?;
            encoding::decode_array(text)
                .map_err(|e| CryptoError::InvalidMetadata(format!("nonce: {e}")))
        };

        match level {
            SecurityLevel::QuantumOtp => Ok(AlgorithmMetadata::QuantumOtp {
                plaintext_length: plaintext_length()?,
            }),
            SecurityLevel::QuantumAes => {
                let text = wire.iv.as_deref().ok_or_else(|| {
                    CryptoError::InvalidMetadata("QUANTUM_AES metadata missing iv".to_string())
                })?;
                let iv = encoding::decode_array(text)
                    .map_err(|e| CryptoError::InvalidMetadata(format!("iv: {e}")))?;
                Ok(AlgorithmMetadata::QuantumAes {
                    iv,
                    plaintext_length: plaintext_length()?,
                })
            }
            SecurityLevel::PostQuantum => Ok(AlgorithmMetadata::PostQuantum { nonce: nonce()? }),
            SecurityLevel::Classical => Ok(AlgorithmMetadata::Classical { nonce: nonce()? }),
        }
    }
}
