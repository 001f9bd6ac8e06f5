//! Simulated key manager for development and testing.
//!
//! Generates keys with the operating system CSPRNG instead of a QKD link.
//! Issued keys are written to a durable [`KeyStore`] so messages encrypted
//! before a restart stay decryptable after it.

use crate::error::{KmError, KmResult};
use crate::manager::KeyManager;
use crate::store::{KeyStore, StoreSnapshot};
use crate::types::{KeyRecord, ManagerMode, ManagerStatus};
use async_trait::async_trait;
use chrono::Utc;
use rand::RngCore;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const ID_PREFIX: &str = "SIM-KEY";

/// Locally generated, optionally persistent key manager.
///
/// Lookups share a read lock. Issue, release, and clear hold the write lock
/// across both the map update and the store rewrite, and the in-memory map
/// only changes once the rewrite has succeeded.
#[derive(Clone)]
pub struct SimulatedKeyManager {
    state: Arc<RwLock<StoreSnapshot>>,
    store: Option<KeyStore>,
}

impl SimulatedKeyManager {
    /// Creates a manager with no durable store.
    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreSnapshot::default())),
            store: None,
        }
    }

    /// Opens (or starts) a persistent manager backed by the file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> KmResult<Self> {
        let store = KeyStore::new(path);
        let snapshot = match store.load().await? {
            Some(snapshot) => {
                info!(
                    "loaded {} simulated keys from {}",
                    snapshot.keys.len(),
                    store.path().display()
                );
                snapshot
            }
            None => StoreSnapshot::default(),
        };

        Ok(Self {
            state: Arc::new(RwLock::new(snapshot)),
            store: Some(store),
        })
    }

    /// Returns whether issued keys are persisted.
    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    /// Number of keys currently held.
    pub async fn len(&self) -> usize {
        self.state.read().await.keys.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.keys.is_empty()
    }

    /// Removes every key. The sequence counter keeps counting so identifiers
    /// are never reused.
    pub async fn clear_all(&self) -> KmResult<usize> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let count = next.keys.len();
        next.keys.clear();
        self.persist(&next).await?;
        *state = next;

        info!("cleared {count} simulated keys");
        Ok(count)
    }

    async fn persist(&self, snapshot: &StoreSnapshot) -> KmResult<()> {
        match &self.store {
            Some(store) => store.save(snapshot).await.inspect_err(|e| {
                warn!("failed to persist simulated key store: {e}");
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl KeyManager for SimulatedKeyManager {
    async fn status(&self) -> KmResult<ManagerStatus> {
        let state = self.state.read().await;
        Ok(ManagerStatus {
            mode: ManagerMode::Simulation,
            operational: true,
            keys_issued: Some(state.sequence_counter),
            keys_stored: state.keys.len() as u64,
            default_key_size: Some(256),
            max_key_count: None,
            checked_at: Utc::now(),
        })
    }

    async fn issue_keys(&self, bit_size: u32, count: u32) -> KmResult<Vec<KeyRecord>> {
        if bit_size == 0 {
            return Err(KmError::InvalidRequest("key size must be positive".to_string()));
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let byte_len = bit_size.div_ceil(8) as usize;
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let mut issued = Vec::with_capacity(count as usize);

        for _ in 0..count {
            let mut material = vec![0u8; byte_len];
            rand::rngs::OsRng.fill_bytes(&mut material);

            next.sequence_counter += 1;
            let now = Utc::now();
            let id = format!(
                "{ID_PREFIX}-{:08}-{}",
                next.sequence_counter,
                now.format("%Y%m%d%H%M%S")
            );

            let record = KeyRecord::new(id.clone(), material, bit_size, now)?;
            next.keys.insert(id, record.clone());
            issued.push(record);
        }

        self.persist(&next).await?;
        *state = next;

        for key in &issued {
            info!("issued simulated key {} ({bit_size} bits)", key.id());
        }
        Ok(issued)
    }

    async fn fetch_by_id(&self, id: &str) -> KmResult<Option<KeyRecord>> {
        let state = self.state.read().await;
        match state.keys.get(id) {
            Some(key) => {
                debug!("retrieved simulated key {id}");
                Ok(Some(key.clone()))
            }
            None => {
                warn!("simulated key not found: {id}");
                Ok(None)
            }
        }
    }

    async fn release(&self, id: &str) -> KmResult<bool> {
        let mut state = self.state.write().await;
        if !state.keys.contains_key(id) {
            debug!("release of unknown simulated key {id} ignored");
            return Ok(false);
        }

        let mut next = state.clone();
        next.keys.remove(id);
        self.persist(&next).await?;
        *state = next;

        info!("released simulated key {id}");
        Ok(true)
    }
}
