//! Durable JSON file backing the simulated key manager.
//!
//! The whole key map is rewritten on every mutation: serialized to a
//! sibling temp file, flushed to disk, then renamed over the live file. A
//! crash leaves either the old store or the new one, never a partial write.

use crate::error::{KmError, KmResult};
use crate::types::KeyRecord;
use chrono::{DateTime, Utc};
use qmail_crypto::encoding;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// In-memory view of everything the store file holds.
#[derive(Clone, Debug, Default)]
pub struct StoreSnapshot {
    pub keys: BTreeMap<String, KeyRecord>,
    pub sequence_counter: u64,
}

/// On-disk layout.
#[derive(Serialize, Deserialize)]
struct StoreFile {
    keys: BTreeMap<String, String>,
    sequence_counter: u64,
    last_updated: DateTime<Utc>,
    /// Issuance times; absent in stores written before it was recorded.
    #[serde(default)]
    issued_at: BTreeMap<String, DateTime<Utc>>,
    /// Declared key sizes in bits; absent entries are derived from the material.
    #[serde(default)]
    bit_sizes: BTreeMap<String, u32>,
}

/// Location of a durable key store.
#[derive(Clone, Debug)]
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the store. Returns `Ok(None)` if no store has been written yet.
    pub async fn load(&self) -> KmResult<Option<StoreSnapshot>> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(KmError::Storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        let file: StoreFile = serde_json::from_str(&json).map_err(|e| {
            KmError::Storage(format!("corrupt key store {}: {e}", self.path.display()))
        })?;

        let fallback = file.last_updated;
        let mut keys = BTreeMap::new();
        for (id, encoded) in file.keys {
            let material = encoding::decode(&encoded).map_err(|e| {
                KmError::Storage(format!("key {id} has invalid material encoding: {e}"))
            })?;
            let created_at = file.issued_at.get(&id).copied().unwrap_or(fallback);
            let record = match file.bit_sizes.get(&id) {
                Some(&bits) => KeyRecord::new(id.clone(), material, bits, created_at)
                    .map_err(|e| KmError::Storage(format!("key {id} is inconsistent: {e}")))?,
                None => KeyRecord::from_material(id.clone(), material, created_at),
            };
            keys.insert(id, record);
        }

        debug!("loaded {} keys from {}", keys.len(), self.path.display());
        Ok(Some(StoreSnapshot {
            keys,
            sequence_counter: file.sequence_counter,
        }))
    }

    /// Atomically replaces the store with `snapshot`.
    pub async fn save(&self, snapshot: &StoreSnapshot) -> KmResult<()> {
        let file = StoreFile {
            keys: snapshot
                .keys
                .iter()
                .map(|(id, key)| (id.clone(), encoding::encode(key.material())))
                .collect(),
            sequence_counter: snapshot.sequence_counter,
            last_updated: Utc::now(),
            issued_at: snapshot
                .keys
                .iter()
                .map(|(id, key)| (id.clone(), key.created_at()))
                .collect(),
            bit_sizes: snapshot
                .keys
                .iter()
                .map(|(id, key)| (id.clone(), key.bit_size()))
                .collect(),
        };
        let json = serde_json::to_vec_pretty(&file)?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &json))
            .await
            .map_err(|e| KmError::Storage(format!("store writer panicked: {e}")))??;

        debug!(
            "persisted {} keys to {}",
            snapshot.keys.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Writes `data` to a temp file beside `path`, syncs it, then renames it into
/// place. The temp file is created owner-only (0600 on unix).
fn write_atomic(path: &Path, data: &[u8]) -> KmResult<()> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                KmError::Storage(format!("failed to create {}: {e}", dir.display()))
            })?;
            dir
        }
        None => Path::new("."),
    };

    let storage_err =
        |e: std::io::Error| KmError::Storage(format!("failed to write {}: {e}", path.display()));

    let mut tmp = tempfile::Builder::new()
        .prefix(".qkd-store")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(storage_err)?;
    tmp.write_all(data).map_err(storage_err)?;
    tmp.as_file().sync_all().map_err(storage_err)?;
    tmp.persist(path).map_err(|e| storage_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path().join("absent.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path().join("nested/keys.json"));
        store.save(&StoreSnapshot::default()).await.unwrap();
        store.save(&StoreSnapshot::default()).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("keys.json")]);
    }

    #[tokio::test]
    async fn file_layout_matches_documented_shape() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path().join("keys.json"));
        let mut snapshot = StoreSnapshot::default();
        snapshot.sequence_counter = 3;
        snapshot.keys.insert(
            "k-3".into(),
            KeyRecord::from_material("k-3", vec![1, 2, 3], Utc::now()),
        );
        store.save(&snapshot).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["keys"]["k-3"], "AQID");
        assert_eq!(raw["sequence_counter"], 3);
        assert!(raw["last_updated"].is_string());
    }

    #[tokio::test]
    async fn loads_store_without_issue_times() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        std::fs::write(
            &path,
            r#"{"keys":{"old":"AAAA"},"sequence_counter":1,"last_updated":"2025-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        let snapshot = KeyStore::new(&path).load().await.unwrap().unwrap();
        let key = &snapshot.keys["old"];
        assert_eq!(key.material(), &[0u8, 0, 0]);
        assert_eq!(key.created_at().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn declared_bit_size_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path().join("keys.json"));
        let mut snapshot = StoreSnapshot::default();
        snapshot.keys.insert(
            "k-100".into(),
            KeyRecord::new("k-100", vec![0u8; 13], 100, Utc::now()).unwrap(),
        );
        store.save(&snapshot).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.keys["k-100"].bit_size(), 100);
        assert_eq!(loaded.keys["k-100"].material().len(), 13);
    }

    #[tokio::test]
    async fn oversized_declared_bit_size_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.json");
        std::fs::write(
            &path,
            r#"{"keys":{"k":"AA=="},"sequence_counter":1,"last_updated":"2025-01-01T00:00:00Z","bit_sizes":{"k":256}}"#,
        )
        .unwrap();

        let result = KeyStore::new(&path).load().await;
        assert!(matches!(result, Err(KmError::Storage(_))));
    }
}
