use crate::error::{CryptoError, CryptoResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Encryption strategy selectable per operation.
///
/// Serialized as its numeric tag (1..=4). The wire name is available through
/// [`SecurityLevel::name`] and is what packages carry in
/// `security_level_name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SecurityLevel {
    /// One-time pad over quantum key material.
    QuantumOtp,
    /// AES-256-CBC keyed from quantum material.
    #[default]
    QuantumAes,
    /// AES-256-GCM over a KEM-derived session key.
    PostQuantum,
    /// AES-256-GCM over a conventionally sourced key.
    Classical,
}

impl SecurityLevel {
    pub const ALL: [SecurityLevel; 4] = [
        SecurityLevel::QuantumOtp,
        SecurityLevel::QuantumAes,
        SecurityLevel::PostQuantum,
        SecurityLevel::Classical,
    ];

    /// Numeric tag embedded in packages and metadata.
    pub fn tag(self) -> u8 {
        match self {
            SecurityLevel::QuantumOtp => 1,
            SecurityLevel::QuantumAes => 2,
            SecurityLevel::PostQuantum => 3,
            SecurityLevel::Classical => 4,
        }
    }

    /// Wire name carried in `security_level_name`.
    pub fn name(self) -> &'static str {
        match self {
            SecurityLevel::QuantumOtp => "QUANTUM_OTP",
            SecurityLevel::QuantumAes => "QUANTUM_AES",
            SecurityLevel::PostQuantum => "POST_QUANTUM",
            SecurityLevel::Classical => "CLASSICAL",
        }
    }

    pub fn from_tag(tag: u8) -> CryptoResult<Self> {
        match tag {
            1 => Ok(SecurityLevel::QuantumOtp),
            2 => Ok(SecurityLevel::QuantumAes),
            3 => Ok(SecurityLevel::PostQuantum),
            4 => Ok(SecurityLevel::Classical),
            other => Err(CryptoError::UnsupportedLevel(other)),
        }
    }

    /// True for the levels whose key material is expected to come from a
    /// quantum key manager.
    pub fn is_quantum(self) -> bool {
        matches!(
            self,
            SecurityLevel::QuantumOtp | SecurityLevel::QuantumAes | SecurityLevel::PostQuantum
        )
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<SecurityLevel> for u8 {
    fn from(level: SecurityLevel) -> u8 {
        level.tag()
    }
}

impl TryFrom<u8> for SecurityLevel {
    type Error = CryptoError;

    fn try_from(tag: u8) -> CryptoResult<Self> {
        SecurityLevel::from_tag(tag)
    }
}

impl FromStr for SecurityLevel {
    type Err = CryptoError;

    /// Accepts the wire name (`QUANTUM_AES`), the variant name
    /// (`QuantumAES`), or the numeric tag (`2`), case-insensitively.
    fn from_str(s: &str) -> CryptoResult<Self> {
        let trimmed = s.trim();
        if let Ok(tag) = trimmed.parse::<u8>() {
            return SecurityLevel::from_tag(tag);
        }
        let normalized: String = trimmed
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "quantumotp" => Ok(SecurityLevel::QuantumOtp),
            "quantumaes" => Ok(SecurityLevel::QuantumAes),
            "postquantum" => Ok(SecurityLevel::PostQuantum),
            "classical" => Ok(SecurityLevel::Classical),
            _ => Err(CryptoError::InvalidMetadata(format!(
                "unknown security level name: {s}"
            ))),
        }
    }
}
