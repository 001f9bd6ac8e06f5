//! Encryption engine for QMail.
//!
//! Provides four interchangeable security levels behind a single stateless
//! engine:
//! - **Quantum OTP**: one-time pad over quantum key material
//! - **Quantum AES**: AES-256-CBC keyed from quantum material
//! - **Post-Quantum**: AES-256-GCM over a session key produced by an
//!   external post-quantum KEM
//! - **Classical**: AES-256-GCM over conventionally sourced keys
//!
//! # Architecture
//!
//! The engine knows nothing about where keys come from or where ciphertext
//! goes. Every call takes the key material by reference and returns the
//! ciphertext together with an [`AlgorithmMetadata`] value. The metadata is a
//! tagged union keyed by [`SecurityLevel`], so decryption can pick the right
//! algorithm without any outside context.

pub mod encoding;
mod engine;
mod error;
mod level;
mod metadata;

pub use engine::{AES_KEY_SIZE, EncryptionEngine, IV_SIZE, NONCE_SIZE, TAG_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use level::SecurityLevel;
pub use metadata::AlgorithmMetadata;
