//! Walks a message through every security level, then encrypts, decrypts
//! and saves an attachment.
//!
//! Key manager and cipher settings come from the environment (`QKD_USE_MOCK`,
//! `QKD_KM_*`, `QKD_KEY_STORE`, `DEFAULT_SECURITY_LEVEL`, `MAX_EMAIL_SIZE`).
//! Log verbosity follows `RUST_LOG`.

use anyhow::{Context, Result, ensure};
use qmail_cipher::{AttachmentCipher, CipherConfig, MessageCipher, format_file_size};
use qmail_crypto::SecurityLevel;
use qmail_km::{KeyManagerConfig, connect};
use tracing::info;

const MESSAGE: &str = "Hello! This is a quantum-encrypted message from QMail.";

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let km_config = KeyManagerConfig::from_env().context("reading key manager settings")?;
    let cipher_config = CipherConfig::from_env().context("reading cipher settings")?;
    let key_manager = connect(&km_config)
        .await
        .context("connecting to key manager")?;

    let messages = MessageCipher::with_config(key_manager, cipher_config);
    let status = messages.key_manager_status().await?;
    info!(
        "key manager: mode={:?} operational={} stored={}",
        status.mode, status.operational, status.keys_stored
    );

    for level in SecurityLevel::ALL {
        let package = messages
            .encrypt_message(MESSAGE, level, Some("bob@example.com"))
            .await
            .with_context(|| format!("encrypting at {level}"))?;
        let decrypted = messages
            .decrypt_message(&package)
            .await
            .with_context(|| format!("decrypting at {level}"))?;
        ensure!(decrypted == MESSAGE, "{level} round trip changed the message");

        println!(
            "{:<13} key={} ciphertext={} chars",
            level.name(),
            package.key_id,
            package.ciphertext.len()
        );
    }

    let attachments = AttachmentCipher::from_cipher(messages.clone());
    let body = b"Quarterly numbers attached. Keep this one quiet.";
    let encrypted = attachments
        .encrypt_attachment("summary.txt", body, messages.config().default_level)
        .await?;
    let attachment = attachments.decrypt_attachment(&encrypted).await?;
    ensure!(attachment.content == body, "attachment round trip changed the content");

    let out_dir = std::env::temp_dir().join("qmail-demo");
    let saved = attachments.save_attachment(&attachment, &out_dir).await?;
    println!(
        "attachment {} ({}, {}) saved to {}",
        attachment.filename,
        attachment.content_type,
        format_file_size(attachment.size),
        saved.display()
    );

    Ok(())
}
