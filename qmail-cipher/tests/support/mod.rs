//! Shared helpers for cipher integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use qmail_cipher::{AttachmentCipher, CipherConfig, MessageCipher};
use qmail_km::{KeyManager, KeyRecord, KmError, KmResult, ManagerStatus, SimulatedKeyManager};
use std::sync::Arc;

pub fn simulated() -> Arc<SimulatedKeyManager> {
    Arc::new(SimulatedKeyManager::in_memory())
}

pub fn message_cipher() -> (MessageCipher, Arc<SimulatedKeyManager>) {
    let km = simulated();
    (MessageCipher::new(km.clone()), km)
}

pub fn attachment_cipher(config: CipherConfig) -> (AttachmentCipher, Arc<SimulatedKeyManager>) {
    let km = simulated();
    (AttachmentCipher::new(km.clone(), config), km)
}

/// A key manager whose every call fails as if the service were down.
pub struct DownKeyManager;

#[async_trait]
impl KeyManager for DownKeyManager {
    async fn status(&self) -> KmResult<ManagerStatus> {
        Err(KmError::Unavailable("connection refused".into()))
    }

    async fn issue_keys(&self, _bit_size: u32, _count: u32) -> KmResult<Vec<KeyRecord>> {
        Err(KmError::Unavailable("connection refused".into()))
    }

    async fn fetch_by_id(&self, _id: &str) -> KmResult<Option<KeyRecord>> {
        Err(KmError::Unavailable("connection refused".into()))
    }

    async fn release(&self, _id: &str) -> KmResult<bool> {
        Err(KmError::Unavailable("connection refused".into()))
    }
}

/// A key manager that answers issuance requests with an empty list.
pub struct EmptyKeyManager;

#[async_trait]
impl KeyManager for EmptyKeyManager {
    async fn status(&self) -> KmResult<ManagerStatus> {
        Err(KmError::Unavailable("not implemented".into()))
    }

    async fn issue_keys(&self, _bit_size: u32, _count: u32) -> KmResult<Vec<KeyRecord>> {
        Ok(Vec::new())
    }

    async fn fetch_by_id(&self, _id: &str) -> KmResult<Option<KeyRecord>> {
        Ok(None)
    }

    async fn release(&self, _id: &str) -> KmResult<bool> {
        Ok(false)
    }
}
