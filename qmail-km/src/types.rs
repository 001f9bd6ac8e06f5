//! Shared types for key manager operations.

use crate::error::{KmError, KmResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A unit of key material issued by a key manager.
///
/// Immutable once issued. The material is wiped when the record is dropped
/// and never appears in `Debug` output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyRecord {
    #[zeroize(skip)]
    id: String,
    material: Vec<u8>,
    #[zeroize(skip)]
    bit_size: u32,
    #[zeroize(skip)]
    created_at: DateTime<Utc>,
}

impl KeyRecord {
    /// Builds a record, enforcing `material.len() * 8 >= bit_size`.
    pub fn new(
        id: impl Into<String>,
        material: Vec<u8>,
        bit_size: u32,
        created_at: DateTime<Utc>,
    ) -> KmResult<Self> {
        let available = (material.len() as u64) * 8;
        if available < u64::from(bit_size) {
            return Err(KmError::InvalidRequest(format!(
                "key material holds {available} bits, declared {bit_size}"
            )));
        }
        Ok(Self {
            id: id.into(),
            material,
            bit_size,
            created_at,
        })
    }

    /// Builds a record whose declared size is exactly its material length.
    pub fn from_material(
        id: impl Into<String>,
        material: Vec<u8>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let bit_size = u32::try_from(material.len().saturating_mul(8)).unwrap_or(u32::MAX);
        Self {
            id: id.into(),
            material,
            bit_size,
            created_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn material(&self) -> &[u8] {
        &self.material
    }

    pub fn bit_size(&self) -> u32 {
        self.bit_size
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl fmt::Debug for KeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRecord")
            .field("id", &self.id)
            .field("material", &format_args!("<{} bytes redacted>", self.material.len()))
            .field("bit_size", &self.bit_size)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Which kind of key manager produced a status report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagerMode {
    Remote,
    Simulation,
}

/// Operational counters reported by a key manager.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ManagerStatus {
    pub mode: ManagerMode,
    pub operational: bool,
    /// Keys issued over the manager's lifetime (remote managers may not
    /// report this).
    pub keys_issued: Option<u64>,
    /// Keys currently held and retrievable.
    pub keys_stored: u64,
    #[serde(default)]
    pub default_key_size: Option<u32>,
    #[serde(default)]
    pub max_key_count: Option<u64>,
    pub checked_at: DateTime<Utc>,
}
