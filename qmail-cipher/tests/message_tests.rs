mod support;

use pretty_assertions::assert_eq;
use qmail_cipher::{CipherConfig, CipherError, EncryptedPackage, MessageCipher};
use qmail_crypto::{AlgorithmMetadata, CryptoError, SecurityLevel, encoding};
use qmail_km::{KeyManager, KmError, ManagerMode};
use std::sync::Arc;
use support::{DownKeyManager, EmptyKeyManager, message_cipher};

// ── Round trips ──

#[tokio::test]
async fn roundtrip_every_level() {
    let (cipher, _) = message_cipher();
    for level in SecurityLevel::ALL {
        for text in ["", "x", "Quantum-secured mail with ünïcödé ✉"] {
            let package = cipher.encrypt_message(text, level, None).await.unwrap();
            assert_eq!(package.security_level, level);
            assert_eq!(package.security_level_name, level.name());
            assert_eq!(cipher.decrypt_message(&package).await.unwrap(), text);
        }
    }
}

#[tokio::test]
async fn hello_bob_quantum_aes() {
    let (cipher, km) = message_cipher();
    let package = cipher
        .encrypt_message("Hello, Bob!", SecurityLevel::QuantumAes, Some("bob@example.com"))
        .await
        .unwrap();

    assert_eq!(package.security_level.tag(), 2);
    assert_eq!(package.security_level_name, "QUANTUM_AES");
    assert_eq!(package.recipient_id.as_deref(), Some("bob@example.com"));
    match &package.metadata {
        AlgorithmMetadata::QuantumAes {
            plaintext_length, ..
        } => assert_eq!(*plaintext_length, 11),
        other => panic!("unexpected metadata {other:?}"),
    }
    // 11 bytes pad to a single AES block.
    assert_eq!(encoding::decode(&package.ciphertext).unwrap().len(), 16);
    assert!(km.fetch_by_id(&package.key_id).await.unwrap().is_some());

    assert_eq!(cipher.decrypt_message(&package).await.unwrap(), "Hello, Bob!");
}

#[tokio::test]
async fn otp_key_matches_long_payload() {
    let (cipher, km) = message_cipher();
    let text = "a".repeat(100);
    let package = cipher
        .encrypt_message(&text, SecurityLevel::QuantumOtp, None)
        .await
        .unwrap();

    let key = km.fetch_by_id(&package.key_id).await.unwrap().unwrap();
    assert_eq!(key.bit_size(), 800);
    assert_eq!(encoding::decode(&package.ciphertext).unwrap().len(), 100);
}

#[tokio::test]
async fn otp_short_payload_uses_minimum_key() {
    let (cipher, km) = message_cipher();
    let package = cipher
        .encrypt_message("hi", SecurityLevel::QuantumOtp, None)
        .await
        .unwrap();
    let key = km.fetch_by_id(&package.key_id).await.unwrap().unwrap();
    assert_eq!(key.bit_size(), 256);
}

#[tokio::test]
async fn each_message_gets_its_own_key() {
    let (cipher, km) = message_cipher();
    let a = cipher.encrypt_message("one", SecurityLevel::Classical, None).await.unwrap();
    let b = cipher.encrypt_message("one", SecurityLevel::Classical, None).await.unwrap();
    assert_ne!(a.key_id, b.key_id);
    assert_ne!(a.ciphertext, b.ciphertext);
    assert_eq!(km.len().await, 2);
}

#[tokio::test]
async fn default_level_comes_from_config() {
    let km = support::simulated();
    let cipher = MessageCipher::with_config(
        km,
        CipherConfig {
            default_level: SecurityLevel::PostQuantum,
            ..CipherConfig::default()
        },
    );
    let package = cipher.encrypt_with_default_level("hi", None).await.unwrap();
    assert_eq!(package.security_level, SecurityLevel::PostQuantum);
}

// ── JSON ──

#[tokio::test]
async fn json_roundtrip() {
    let (cipher, _) = message_cipher();
    let json = cipher
        .encrypt_message_to_json("over the wire", SecurityLevel::QuantumOtp, None)
        .await
        .unwrap();
    assert_eq!(
        cipher.decrypt_message_from_json(&json).await.unwrap(),
        "over the wire"
    );
}

#[tokio::test]
async fn json_layout() {
    let (cipher, _) = message_cipher();
    let json = cipher
        .encrypt_message_to_json("layout", SecurityLevel::Classical, None)
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["security_level"], 4);
    assert_eq!(value["security_level_name"], "CLASSICAL");
    assert_eq!(value["metadata"]["security_level"], 4);
    assert_eq!(value["metadata"]["algorithm"], "AES-256-GCM");
    assert!(value["metadata"]["nonce"].is_string());
    assert!(value["key_id"].is_string());
    assert!(value["timestamp"].is_string());
    assert!(value.get("recipient_id").is_none());
}

#[tokio::test]
async fn malformed_json_is_serialization_error() {
    let (cipher, _) = message_cipher();
    let err = cipher.decrypt_message_from_json("{\"ciphertext\":").await.unwrap_err();
    assert!(matches!(err, CipherError::Serialization(_)));
}

// ── Failures ──

#[tokio::test]
async fn level_mismatch_is_detected() {
    let (cipher, _) = message_cipher();
    let mut package = cipher
        .encrypt_message("secret", SecurityLevel::Classical, None)
        .await
        .unwrap();
    package.security_level = SecurityLevel::PostQuantum;

    let err = cipher.decrypt_message(&package).await.unwrap_err();
    assert!(matches!(
        err,
        CipherError::LevelMismatch {
            declared: SecurityLevel::PostQuantum,
            embedded: SecurityLevel::Classical,
        }
    ));
}

#[tokio::test]
async fn level_name_disagreeing_with_tag_is_rejected() {
    let (cipher, _) = message_cipher();
    let mut package = cipher
        .encrypt_message("secret", SecurityLevel::QuantumAes, None)
        .await
        .unwrap();
    package.security_level_name = "CLASSICAL".to_string();

    let err = cipher.decrypt_message(&package).await.unwrap_err();
    assert!(matches!(err, CipherError::InvalidEncoding(_)));

    package.security_level_name = "quantum_aes".to_string();
    assert!(package.check_consistency().is_err());
}

#[tokio::test]
async fn released_key_is_unavailable() {
    let (cipher, km) = message_cipher();
    let package = cipher
        .encrypt_message("gone soon", SecurityLevel::QuantumAes, None)
        .await
        .unwrap();
    assert!(km.release(&package.key_id).await.unwrap());

    let err = cipher.decrypt_message(&package).await.unwrap_err();
    assert!(matches!(err, CipherError::KeyUnavailable(id) if id == package.key_id));
}

#[tokio::test]
async fn bad_ciphertext_encoding() {
    let (cipher, _) = message_cipher();
    let mut package = cipher
        .encrypt_message("x", SecurityLevel::Classical, None)
        .await
        .unwrap();
    package.ciphertext = "!!not base64!!".into();
    assert!(matches!(
        cipher.decrypt_message(&package).await,
        Err(CipherError::InvalidEncoding(_))
    ));
}

#[tokio::test]
async fn tampered_gcm_ciphertext_fails_authentication() {
    let (cipher, _) = message_cipher();
    let mut package = cipher
        .encrypt_message("integrity", SecurityLevel::PostQuantum, None)
        .await
        .unwrap();
    let mut bytes = encoding::decode(&package.ciphertext).unwrap();
    bytes[0] ^= 0x01;
    package.ciphertext = encoding::encode(&bytes);

    assert!(matches!(
        cipher.decrypt_message(&package).await,
        Err(CipherError::Crypto(CryptoError::AuthenticationFailed))
    ));
}

#[tokio::test]
async fn otp_garbage_is_corrupt_plaintext() {
    let (cipher, _) = message_cipher();
    let mut package = cipher
        .encrypt_message("ab", SecurityLevel::QuantumOtp, None)
        .await
        .unwrap();
    // Flip the high bits so the pad yields bytes that cannot be UTF-8.
    let mut bytes = encoding::decode(&package.ciphertext).unwrap();
    for b in &mut bytes {
        *b ^= 0xC0;
    }
    package.ciphertext = encoding::encode(&bytes);

    assert!(matches!(
        cipher.decrypt_message(&package).await,
        Err(CipherError::CorruptPlaintext(_))
    ));
}

#[tokio::test]
async fn unavailable_manager_propagates() {
    let cipher = MessageCipher::new(Arc::new(DownKeyManager));
    let err = cipher
        .encrypt_message("hi", SecurityLevel::QuantumAes, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CipherError::KeyManager(KmError::Unavailable(_))));
    assert!(matches!(
        cipher.key_manager_status().await,
        Err(CipherError::KeyManager(KmError::Unavailable(_)))
    ));
}

#[tokio::test]
async fn empty_issuance_is_key_issuance_error() {
    let cipher = MessageCipher::new(Arc::new(EmptyKeyManager));
    let err = cipher
        .encrypt_message("hi", SecurityLevel::Classical, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CipherError::KeyIssuance(_)));
}

// ── Status ──

#[tokio::test]
async fn status_passes_through() {
    let (cipher, _) = message_cipher();
    cipher.encrypt_message("a", SecurityLevel::Classical, None).await.unwrap();
    let status = cipher.key_manager_status().await.unwrap();
    assert_eq!(status.mode, ManagerMode::Simulation);
    assert_eq!(status.keys_issued, Some(1));
}

#[tokio::test]
async fn package_survives_serde() {
    let (cipher, _) = message_cipher();
    let package = cipher
        .encrypt_message("persist me", SecurityLevel::QuantumOtp, Some("carol"))
        .await
        .unwrap();
    let back = EncryptedPackage::from_json(&package.to_json().unwrap()).unwrap();
    assert_eq!(back, package);
}
