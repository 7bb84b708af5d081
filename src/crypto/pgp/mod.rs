//! PGP cryptographic operations.
//!
//! This module handles:
//! - RSA key pair generation bound to an identity, with optional expiry
//! - Passphrase locking and unlocking of private keys
//! - Armored and base64 export of key material
//! - Message encryption and decryption

pub mod cipher;
pub mod export;
pub mod identity;
pub mod keypair;
pub mod passphrase;
pub mod provision;

pub use cipher::{CiphertextEncoding, EncryptedMessage, MessageCipher};
pub use export::{ExportedKeyMaterial, KeyExporter};
pub use identity::Identity;
pub use keypair::{
    is_expired, parse_public_key, parse_public_key_base64, public_key_expired,
    public_key_fingerprint, public_key_user_id, KeyGenerator, KeyPair, LockState,
};
pub use passphrase::SecurePassphrase;
pub use provision::{provision, ProvisionedKey};

use crate::crypto::error::{PgpError, Result};
use base64::{engine::general_purpose, Engine as _};

/// Decode standard base64, ignoring line breaks and other ASCII whitespace.
pub(crate) fn decode_base64(input: &str) -> Result<Vec<u8>> {
    let compact: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(PgpError::Decoding("input is empty".into()));
    }
    general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| PgpError::Decoding(format!("Failed to base64-decode input: {}", e)))
}
