//! Key manager configuration.

use crate::error::{KmError, KmResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which key manager implementation to construct.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyManagerMode {
    #[default]
    Simulated,
    Remote,
}

/// Configuration for the key manager layer.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KeyManagerConfig {
    pub mode: KeyManagerMode,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub simulated: SimulatedConfig,
}

/// Connection settings for a remote key-distribution service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Scheme, host and port of the KMS (e.g., "http://localhost:8080").
    pub endpoint: String,

    /// API version path segment.
    pub api_version: String,

    /// SAE identifier of this application (the key consumer).
    pub master_sae_id: String,

    /// SAE identifier of the peer application, if keys are shared with one.
    pub slave_sae_id: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Verify the KMS TLS certificate.
    pub verify_tls: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            api_version: "v1".to_string(),
            master_sae_id: String::new(),
            slave_sae_id: None,
            timeout_secs: 30,
            verify_tls: true,
        }
    }
}

/// Settings for the simulated key manager.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulatedConfig {
    /// Durable store location. `None` keeps keys in memory only.
    pub store_path: Option<PathBuf>,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            store_path: Some(PathBuf::from("instance/simulated_qkd_keys.json")),
        }
    }
}

impl KeyManagerConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> KmResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through an arbitrary variable lookup.
    ///
    /// Recognised variables: `QKD_USE_MOCK`, `QKD_KM_HOST`, `QKD_KM_PORT`,
    /// `QKD_KM_USE_HTTPS`, `QKD_KM_API_VERSION`, `QKD_KM_MASTER_SAE_ID`,
    /// `QKD_KM_SLAVE_SAE_ID`, `QKD_KM_TIMEOUT_SECS`, `QKD_KM_VERIFY_SSL`,
    /// `QKD_KEY_STORE`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> KmResult<Self> {
        let flag = |name: &str, default: bool| -> bool {
            lookup(name)
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(default)
        };

        let mode = if flag("QKD_USE_MOCK", true) {
            KeyManagerMode::Simulated
        } else {
            KeyManagerMode::Remote
        };

        let defaults = RemoteConfig::default();
        let host = lookup("QKD_KM_HOST").unwrap_or_else(|| "localhost".to_string());
        let port: u16 = match lookup("QKD_KM_PORT") {
            Some(p) => p
                .trim()
                .parse()
                .map_err(|_| KmError::Config(format!("QKD_KM_PORT is not a port: {p}")))?,
            None => 8080,
        };
        let scheme = if flag("QKD_KM_USE_HTTPS", false) {
            "https"
        } else {
            "http"
        };
        let timeout_secs = match lookup("QKD_KM_TIMEOUT_SECS") {
            Some(t) => t.trim().parse().map_err(|_| {
                KmError::Config(format!("QKD_KM_TIMEOUT_SECS is not a number: {t}"))
            })?,
            None => defaults.timeout_secs,
        };

        let remote = RemoteConfig {
            endpoint: format!("{scheme}://{host}:{port}"),
            api_version: lookup("QKD_KM_API_VERSION").unwrap_or(defaults.api_version),
            master_sae_id: lookup("QKD_KM_MASTER_SAE_ID").unwrap_or_default(),
            slave_sae_id: lookup("QKD_KM_SLAVE_SAE_ID").filter(|s| !s.is_empty()),
            timeout_secs,
            verify_tls: flag("QKD_KM_VERIFY_SSL", true),
        };

        let simulated = match lookup("QKD_KEY_STORE") {
            Some(path) if !path.is_empty() => SimulatedConfig {
                store_path: Some(PathBuf::from(path)),
            },
            _ => SimulatedConfig::default(),
        };

        Ok(Self {
            mode,
            remote,
            simulated,
        })
    }
}
