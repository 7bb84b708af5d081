//! pgpkeys - OpenPGP key pair lifecycle and message encryption
//!
//! This crate generates identity-bound RSA key pairs with optional expiry,
//! exports them armored and base64-encoded with optional passphrase
//! locking, and encrypts/decrypts messages against them. The `cli` and
//! `config` modules form the thin command-line front end.

pub mod cli;
pub mod config;
pub mod crypto;

// Test utilities module (only available in tests)
#[cfg(test)]
pub mod test_utils;

// Re-export commonly used items for convenience
pub use crypto::{
    CiphertextEncoding, Crypto, EncryptedMessage, ExportedKeyMaterial, Identity, KeyExporter,
    KeyGenerator, KeyPair, LockState, MessageCipher, PgpError, PgpErrorKind, SecurePassphrase,
};
