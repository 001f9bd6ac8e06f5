//! Quantum key management for QMail.
//!
//! Provides the [`KeyManager`] contract with two interchangeable
//! implementations:
//! - [`RemoteKeyManager`]: client for an external key-distribution service
//!   (ETSI QKD 014 style REST endpoints)
//! - [`SimulatedKeyManager`]: CSPRNG-backed keys persisted to a JSON store
//!   so they survive restarts
//!
//! The implementation is chosen once, at construction time, via
//! [`connect`]. Callers hold it as `Arc<dyn KeyManager>`.

pub mod config;
pub mod error;
pub mod manager;
pub mod remote;
pub mod simulated;
pub mod store;
pub mod types;

pub use config::{KeyManagerConfig, KeyManagerMode, RemoteConfig, SimulatedConfig};
pub use error::{KmError, KmResult};
pub use manager::{KeyManager, connect};
pub use remote::RemoteKeyManager;
pub use simulated::SimulatedKeyManager;
pub use types::{KeyRecord, ManagerMode, ManagerStatus};
