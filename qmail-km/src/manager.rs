//! The key manager contract and construction-time implementation selection.

use crate::config::{KeyManagerConfig, KeyManagerMode};
use crate::error::KmResult;
use crate::remote::RemoteKeyManager;
use crate::simulated::SimulatedKeyManager;
use crate::types::{KeyRecord, ManagerStatus};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Issues, retrieves, and releases key records.
///
/// Implementations never retry internally. A failure reaches the caller
/// exactly as it happened, and the caller owns any retry policy.
#[async_trait]
pub trait KeyManager: Send + Sync {
    /// Reports operational counters.
    async fn status(&self) -> KmResult<ManagerStatus>;

    /// Issues `count` fresh keys of at least `bit_size` bits each.
    async fn issue_keys(&self, bit_size: u32, count: u32) -> KmResult<Vec<KeyRecord>>;

    /// Looks up a previously issued key. `Ok(None)` means the key never
    /// existed or has been released.
    async fn fetch_by_id(&self, id: &str) -> KmResult<Option<KeyRecord>>;

    /// Releases a key. Returns `true` if a key was removed and `false` if the
    /// identifier was unknown; both are successes.
    async fn release(&self, id: &str) -> KmResult<bool>;

    /// Looks up several keys, skipping identifiers that are not found.
    async fn fetch_many(&self, ids: &[String]) -> KmResult<Vec<KeyRecord>> {
        let mut keys = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(key) = self.fetch_by_id(id).await? {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

/// Builds the key manager selected by `config`.
pub async fn connect(config: &KeyManagerConfig) -> KmResult<Arc<dyn KeyManager>> {
    match config.mode {
        KeyManagerMode::Simulated => {
            info!("using simulated key manager");
            let manager = match &config.simulated.store_path {
                Some(path) => SimulatedKeyManager::open(path).await?,
                None => SimulatedKeyManager::in_memory(),
            };
            Ok(Arc::new(manager))
        }
        KeyManagerMode::Remote => {
            info!("using remote key manager at {}", config.remote.endpoint);
            Ok(Arc::new(RemoteKeyManager::new(config.remote.clone())?))
        }
    }
}
