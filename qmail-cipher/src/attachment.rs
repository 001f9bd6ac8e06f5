//! File attachment encryption.
//!
//! Attachments ride on the message path: content is base64 encoded into
//! text, sealed by [`MessageCipher`], and wrapped with the descriptive
//! fields a mail client needs before decryption.

use crate::config::CipherConfig;
use crate::content_type::{extension_of, format_file_size, guess_content_type};
use crate::error::{CipherError, CipherResult};
use crate::message::MessageCipher;
use crate::package::{Attachment, AttachmentInfo, EncryptedAttachmentPackage};
use qmail_crypto::{SecurityLevel, encoding};
use qmail_km::KeyManager;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Encrypts and decrypts file attachments.
#[derive(Clone)]
pub struct AttachmentCipher {
    cipher: MessageCipher,
}

impl AttachmentCipher {
    pub fn new(key_manager: Arc<dyn KeyManager>, config: CipherConfig) -> Self {
        Self::from_cipher(MessageCipher::with_config(key_manager, config))
    }

    /// Shares an existing message cipher (and its key manager).
    pub fn from_cipher(cipher: MessageCipher) -> Self {
        info!(
            "attachment cipher ready (max size {})",
            format_file_size(cipher.config().max_attachment_size)
        );
        Self { cipher }
    }

    pub fn config(&self) -> &CipherConfig {
        self.cipher.config()
    }

    /// Encrypts in-memory attachment content.
    pub async fn encrypt_attachment(
        &self,
        filename: &str,
        content: &[u8],
        level: SecurityLevel,
    ) -> CipherResult<EncryptedAttachmentPackage> {
        let size = content.len() as u64;
        self.check_size(size)?;
        self.check_level(level)?;

        debug!("encrypting attachment {filename} ({size} bytes)");
        let package = self
            .cipher
            .encrypt_message(&encoding::encode(content), level, None)
            .await?;

        info!(
            "attachment {filename} encrypted with key {} at {level}",
            package.key_id
        );
        Ok(EncryptedAttachmentPackage {
            filename: filename.to_string(),
            content_type: guess_content_type(filename).to_string(),
            original_size: size,
            encrypted_size: package.ciphertext.len() as u64,
            package,
        })
    }

    /// Decrypts an attachment and checks it against its recorded size.
    pub async fn decrypt_attachment(
        &self,
        encrypted: &EncryptedAttachmentPackage,
    ) -> CipherResult<Attachment> {
        debug!(
            "decrypting attachment {} (key {}, {} encrypted bytes)",
            encrypted.filename,
            encrypted.key_id(),
            encrypted.encrypted_size
        );

        let text = self
            .cipher
            .decrypt_message(&encrypted.package)
            .await
            .inspect_err(|e| warn!("failed to decrypt attachment {}: {e}", encrypted.filename))?;

        let content = encoding::decode(&text).map_err(|e| {
            CipherError::CorruptPlaintext(format!("attachment body is not base64: {e}"))
        })?;
        let size = content.len() as u64;
        if size != encrypted.original_size {
            return Err(CipherError::CorruptPlaintext(format!(
                "attachment {} decrypted to {size} bytes, expected {}",
                encrypted.filename, encrypted.original_size
            )));
        }

        info!("attachment {} decrypted ({size} bytes)", encrypted.filename);
        Ok(Attachment {
            filename: encrypted.filename.clone(),
            content,
            content_type: encrypted.content_type.clone(),
            size,
        })
    }

    /// Reads and encrypts a file. The size limit is checked from file
    /// metadata before anything is read.
    pub async fn encrypt_file(
        &self,
        path: impl AsRef<Path>,
        level: SecurityLevel,
    ) -> CipherResult<EncryptedAttachmentPackage> {
        let path = path.as_ref();
        let filename = file_name(path)?;

        let meta = tokio::fs::metadata(path).await.map_err(|e| io_error(path, e))?;
        if !meta.is_file() {
            return Err(CipherError::Io(format!("{} is not a file", path.display())));
        }
        self.check_size(meta.len())?;

        let content = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;
        self.encrypt_attachment(&filename, &content, level).await
    }

    /// Encrypts each file in order, stopping at the first failure.
    pub async fn encrypt_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
        level: SecurityLevel,
    ) -> CipherResult<Vec<EncryptedAttachmentPackage>> {
        let mut packages = Vec::with_capacity(paths.len());
        for path in paths {
            let package = self.encrypt_file(path, level).await.inspect_err(|e| {
                warn!("failed to encrypt {}: {e}", path.as_ref().display());
            })?;
            packages.push(package);
        }
        Ok(packages)
    }

    /// Writes a decrypted attachment into `dir` without overwriting anything.
    /// A taken name becomes `name_1.ext`, `name_2.ext`, and so on. Returns the
    /// path written.
    pub async fn save_attachment(
        &self,
        attachment: &Attachment,
        dir: impl AsRef<Path>,
    ) -> CipherResult<PathBuf> {
        let dir = dir.as_ref();
        // Only the final component is honoured so a crafted name cannot
        // escape `dir`.
        let filename = file_name(Path::new(&attachment.filename))?;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| io_error(dir, e))?;

        let (stem, ext) = split_name(&filename);
        let mut counter = 0u32;
        loop {
            let candidate = match counter {
                0 => dir.join(&filename),
                n => dir.join(format!("{stem}_{n}{ext}")),
            };

            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await;
            match opened {
                Ok(mut file) => {
                    file.write_all(&attachment.content)
                        .await
                        .map_err(|e| io_error(&candidate, e))?;
                    file.flush().await.map_err(|e| io_error(&candidate, e))?;
                    info!("attachment saved to {}", candidate.display());
                    return Ok(candidate);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    counter = counter.checked_add(1).ok_or_else(|| {
                        CipherError::Io(format!("no free name for {filename}"))
                    })?;
                }
                Err(e) => return Err(io_error(&candidate, e)),
            }
        }
    }

    /// Describes a file on disk without reading its content.
    pub async fn attachment_info(&self, path: impl AsRef<Path>) -> CipherResult<AttachmentInfo> {
        let path = path.as_ref();
        let filename = file_name(path)?;
        let meta = tokio::fs::metadata(path).await.map_err(|e| io_error(path, e))?;
        let size = meta.len();

        Ok(AttachmentInfo {
            content_type: guess_content_type(&filename).to_string(),
            extension: extension_of(&filename),
            can_encrypt: meta.is_file() && size <= self.config().max_attachment_size,
            filename,
            size,
        })
    }

    fn check_size(&self, size: u64) -> CipherResult<()> {
        let max = self.config().max_attachment_size;
        if size > max {
            return Err(CipherError::PayloadTooLarge { size, max });
        }
        Ok(())
    }

    fn check_level(&self, level: SecurityLevel) -> CipherResult<()> {
        if level == SecurityLevel::QuantumOtp && !self.config().allow_otp_attachments {
            return Err(CipherError::LevelNotPermitted(level));
        }
        Ok(())
    }
}

fn file_name(path: &Path) -> CipherResult<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| CipherError::Io(format!("{} has no file name", path.display())))
}

/// Splits `report.final.pdf` into `("report.final", ".pdf")`.
fn split_name(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(i) if i > 0 => filename.split_at(i),
        _ => (filename, ""),
    }
}

fn io_error(path: &Path, e: std::io::Error) -> CipherError {
    CipherError::Io(format!("{}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_last_extension() {
        assert_eq!(split_name("report.final.pdf"), ("report.final", ".pdf"));
        assert_eq!(split_name("README"), ("README", ""));
        assert_eq!(split_name(".env"), (".env", ""));
    }

    #[test]
    fn file_name_strips_directories() {
        assert_eq!(file_name(Path::new("../../etc/passwd")).unwrap(), "passwd");
        assert!(file_name(Path::new("..")).is_err());
        assert!(file_name(Path::new("/")).is_err());
    }
}
