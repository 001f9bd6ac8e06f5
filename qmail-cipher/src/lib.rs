//! Message and attachment encryption for QMail.
//!
//! [`MessageCipher`] requests a key from a [`qmail_km::KeyManager`], runs the
//! [`qmail_crypto::EncryptionEngine`], and assembles a self-describing
//! [`EncryptedPackage`]. [`AttachmentCipher`] layers file handling on top:
//! size limits, binary-safe encoding, and content-type labels.

mod attachment;
pub mod config;
pub mod content_type;
pub mod error;
mod message;
pub mod package;

pub use attachment::AttachmentCipher;
pub use config::CipherConfig;
pub use content_type::{
    format_file_size, guess_content_type, is_allowed_file, is_allowed_file_with, is_image_file,
};
pub use error::{CipherError, CipherResult};
pub use message::MessageCipher;
pub use package::{Attachment, AttachmentInfo, EncryptedAttachmentPackage, EncryptedPackage};
