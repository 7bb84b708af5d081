//! Cryptographic operations for pgpkeys
//!
//! This module provides:
//! - PGP key pair generation, export and passphrase locking
//! - PGP message encryption and decryption
//! - Typed errors shared by all of the above

pub mod error;
pub mod pgp;
pub mod utils;

// Re-export main types
pub use error::{PgpError, PgpErrorKind};
pub use self::pgp::{
    CiphertextEncoding, EncryptedMessage, ExportedKeyMaterial, Identity, KeyExporter,
    KeyGenerator, KeyPair, LockState, MessageCipher, SecurePassphrase,
};
pub use utils::Crypto;
