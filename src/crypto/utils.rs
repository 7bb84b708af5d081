//! Cryptographic utilities.
//!
//! Convenience wrappers used by the command-line layer.

use anyhow::Result;
use pgp::composed::SignedPublicKey;
use sha2::{Digest, Sha256};

use crate::crypto::pgp::{
    parse_public_key, parse_public_key_base64, CiphertextEncoding, KeyPair, MessageCipher,
    SecurePassphrase,
};

/// Cryptographic utilities struct.
#[derive(Clone, Copy)]
pub struct Crypto;

impl Crypto {
    /// Lowercase hex SHA-256 of `data`, used to identify encrypt/decrypt results.
    pub fn content_digest(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Parse a public key given either armored or as base64.
    pub fn load_public_key(text: &str) -> Result<SignedPublicKey> {
        if text.trim_start().starts_with("-----BEGIN ") {
            Ok(parse_public_key(text)?)
        } else {
            Ok(parse_public_key_base64(text)?)
        }
    }

    /// Parse a private key given either armored or as base64.
    pub fn load_private_key(text: &str) -> Result<KeyPair> {
        if text.trim_start().starts_with("-----BEGIN ") {
            Ok(KeyPair::from_armored(text)?)
        } else {
            Ok(KeyPair::from_base64(text)?)
        }
    }

    /// Encrypt `plaintext` with a fresh thread-seeded cipher; returns the
    /// armored ciphertext and its digest.
    pub fn encrypt_armored(public_key: &SignedPublicKey, plaintext: &[u8]) -> Result<(String, String)> {
        let encrypted = MessageCipher::default().encrypt(public_key, plaintext)?;
        let digest = Self::content_digest(encrypted.ciphertext().as_bytes());
        Ok((encrypted.into_ciphertext(), digest))
    }

    /// Decrypt `ciphertext`; returns the plaintext and its digest.
    pub fn decrypt(
        key_pair: &KeyPair,
        passphrase: &SecurePassphrase,
        ciphertext: &str,
        encoding: CiphertextEncoding,
    ) -> Result<(Vec<u8>, String)> {
        let plaintext =
            MessageCipher::default().decrypt(key_pair, passphrase, ciphertext, encoding)?;
        let digest = Self::content_digest(&plaintext);
        Ok((plaintext, digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_digest_known_value() {
        assert_eq!(
            Crypto::content_digest(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_load_public_key_rejects_garbage() {
        assert!(Crypto::load_public_key("definitely not a key").is_err());
        assert!(Crypto::load_private_key("-----BEGIN PGP MESSAGE-----\n-----END PGP MESSAGE-----").is_err());
    }
}
