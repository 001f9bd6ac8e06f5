//! HTTP client for an external key-distribution service.
//!
//! Speaks the ETSI GS QKD 014 style REST layout rooted at
//! `{endpoint}/api/{version}/keys/{master_sae_id}`. Each trait operation is
//! exactly one request. Transport failures, timeouts, non-success statuses,
//! and malformed bodies all surface as [`KmError::Unavailable`], and nothing
//! is retried here.

use crate::config::RemoteConfig;
use crate::error::{KmError, KmResult};
use crate::manager::KeyManager;
use crate::types::{KeyRecord, ManagerMode, ManagerStatus};
use async_trait::async_trait;
use chrono::Utc;
use qmail_crypto::encoding;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// One key as returned by the KMS.
#[derive(Deserialize)]
struct WireKey {
    #[serde(rename = "key_ID")]
    key_id: String,
    key: String,
}

#[derive(Deserialize)]
struct KeyContainer {
    #[serde(default)]
    keys: Vec<WireKey>,
}

#[derive(Serialize)]
struct KeyRequest<'a> {
    number: u32,
    size: u32,
    #[serde(rename = "slave_SAE_ID", skip_serializing_if = "Option::is_none")]
    slave_sae_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct StatusResponse {
    #[serde(default)]
    stored_key_count: u64,
    #[serde(default)]
    max_key_count: Option<u64>,
    #[serde(default)]
    key_size: Option<u32>,
    #[serde(default)]
    keys_generated: Option<u64>,
}

/// Client for a remote key manager.
#[derive(Clone)]
pub struct RemoteKeyManager {
    client: Client,
    config: RemoteConfig,
    base_url: Url,
}

impl RemoteKeyManager {
    pub fn new(config: RemoteConfig) -> KmResult<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(KmError::Config("remote endpoint is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| KmError::Config(format!("failed to build HTTP client: {e}")))?;

        let mut base_url = Url::parse(config.endpoint.trim()).map_err(|e| {
            KmError::Config(format!("invalid remote endpoint {}: {e}", config.endpoint))
        })?;
        {
            let mut path = base_url.path_segments_mut().map_err(|_| {
                KmError::Config(format!("remote endpoint {} cannot take a path", config.endpoint))
            })?;
            path.pop_if_empty().extend(["api", config.api_version.as_str(), "keys"]);
            if !config.master_sae_id.is_empty() {
                path.push(&config.master_sae_id);
            }
        }

        info!("remote key manager client initialised: {base_url}");
        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Root URL of the key endpoints for this SAE.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Appends `segments` to the base URL. Each segment is percent-encoded, so
    /// an identifier containing `/`, `?` or `#` stays a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    fn decode_key(wire: WireKey) -> KmResult<KeyRecord> {
        let material = encoding::decode(&wire.key).map_err(|e| {
            KmError::Unavailable(format!("key {} has invalid encoding: {e}", wire.key_id))
        })?;
        Ok(KeyRecord::from_material(wire.key_id, material, Utc::now()))
    }

    fn unavailable(context: &str, e: reqwest::Error) -> KmError {
        warn!("{context} failed: {e}");
        KmError::from(e)
    }
}

#[async_trait]
impl KeyManager for RemoteKeyManager {
    async fn status(&self) -> KmResult<ManagerStatus> {
        let url = self.endpoint(&["status"]);
        let resp: StatusResponse = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Self::unavailable("status", e))?
            .json()
            .await
            .map_err(|e| Self::unavailable("status decode", e))?;

        Ok(ManagerStatus {
            mode: ManagerMode::Remote,
            operational: true,
            keys_issued: resp.keys_generated,
            keys_stored: resp.stored_key_count,
            default_key_size: resp.key_size,
            max_key_count: resp.max_key_count,
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

        let url = self.endpoint(&["enc_keys"]);
        let body = KeyRequest {
            number: count,
            size: bit_size,
            slave_sae_id: self.config.slave_sae_id.as_deref(),
        };
        debug!("requesting {count} key(s) of {bit_size} bits");

        let container: KeyContainer = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Self::unavailable("key issue", e))?
            .json()
            .await
            .map_err(|e| Self::unavailable("key issue decode", e))?;

        let keys = container
            .keys
            .into_iter()
            .map(Self::decode_key)
            .collect::<KmResult<Vec<_>>>()?;

        for key in &keys {
            if key.bit_size() < bit_size {
                return Err(KmError::Unavailable(format!(
                    "KMS returned {}-bit key {} for a {bit_size}-bit request",
                    key.bit_size(),
                    key.id()
                )));
            }
            info!("retrieved key {} ({} bits)", key.id(), key.bit_size());
        }
        Ok(keys)
    }

    async fn fetch_by_id(&self, id: &str) -> KmResult<Option<KeyRecord>> {
        let url = self.endpoint(&["key", id]);
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::unavailable("key fetch", e))?;

        if resp.status() == StatusCode::NOT_FOUND {
            warn!("remote key not found: {id}");
            return Ok(None);
        }

        let wire: WireKey = resp
            .error_for_status()
            .map_err(|e| Self::unavailable("key fetch", e))?
            .json()
            .await
            .map_err(|e| Self::unavailable("key fetch decode", e))?;

        if wire.key_id != id {
            warn!("KMS answered request for key {id} with key {}", wire.key_id);
            return Err(KmError::Unavailable(format!(
                "requested key {id} but KMS returned {}",
                wire.key_id
            )));
        }

        let key = Self::decode_key(wire)?;
        debug!("retrieved key by id {}", key.id());
        Ok(Some(key))
    }

    async fn release(&self, id: &str) -> KmResult<bool> {
        let url = self.endpoint(&["key", id]);
        let resp = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| Self::unavailable("key release", e))?;

        if resp.status() == StatusCode::NOT_FOUND {
            debug!("release of unknown remote key {id} ignored");
            return Ok(false);
        }

        resp.error_for_status()
            .map_err(|e| Self::unavailable("key release", e))?;
        info!("released remote key {id}");
        Ok(true)
    }
}
