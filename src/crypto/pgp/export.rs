//! Armored and base64 renderings of key material.

use crate::crypto::error::{PgpError, Result};
use crate::crypto::pgp::keypair::KeyPair;
use crate::crypto::pgp::passphrase::SecurePassphrase;
use base64::{engine::general_purpose, Engine as _};
use pgp::composed::{SignedPublicKey, SignedSecretKey};
use pgp::ser::Serialize as PgpSerialize;
use rand::rngs::ThreadRng;
use rand::{CryptoRng, Rng};

/// One half of a key pair, rendered for export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedKeyMaterial {
    /// ASCII-armored OpenPGP block.
    pub armored: String,
    /// Standard base64 of the binary packet stream.
    pub base64: String,
}

/// Renders key pairs for export, locking private keys on request.
pub struct KeyExporter<R = ThreadRng> {
    rng: R,
}

impl Default for KeyExporter<ThreadRng> {
    fn default() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl<R: Rng + CryptoRng> KeyExporter<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Render the public half. Identical key state yields identical output.
    pub fn export_public(&self, key_pair: &KeyPair) -> Result<ExportedKeyMaterial> {
        render_public(&key_pair.public_key())
    }

    /// Render the private half, locking it first when `passphrase` is set.
    ///
    /// The input pair is consumed; callers continue with the returned pair,
    /// which is locked whenever `passphrase` is non-empty.
    pub fn export_private(
        &mut self,
        key_pair: KeyPair,
        passphrase: &SecurePassphrase,
    ) -> Result<(KeyPair, ExportedKeyMaterial)> {
        let unlocked = render_secret(key_pair.secret_key())?;
        if passphrase.is_empty() {
            log::info!("Exported unlocked private key {}", key_pair.fingerprint());
            return Ok((key_pair, unlocked));
        }
        log::debug!(
            "Rendered unlocked private key {} ({} armored bytes) before locking",
            key_pair.fingerprint(),
            unlocked.armored.len()
        );

        let locked = key_pair.lock(&mut self.rng, passphrase)?;
        let exported = render_secret(locked.secret_key())?;
        log::info!("Exported locked private key {}", locked.fingerprint());
        Ok((locked, exported))
    }
}

fn render_public(public_key: &SignedPublicKey) -> Result<ExportedKeyMaterial> {
    let armored = public_key
        .to_armored_string(Default::default())
        .map_err(|e| PgpError::Encoding(format!("Failed to armor public key: {}", e)))?;
    let bytes = PgpSerialize::to_bytes(public_key)
        .map_err(|e| PgpError::Encoding(format!("Failed to serialize public key: {}", e)))?;
    Ok(ExportedKeyMaterial {
        armored,
        base64: general_purpose::STANDARD.encode(bytes),
    })
}

fn render_secret(secret_key: &SignedSecretKey) -> Result<ExportedKeyMaterial> {
    let armored = secret_key
        .to_armored_string(Default::default())
        .map_err(|e| PgpError::Encoding(format!("Failed to armor secret key: {}", e)))?;
    let bytes = PgpSerialize::to_bytes(secret_key)
        .map_err(|e| PgpError::Encoding(format!("Failed to serialize secret key: {}", e)))?;
    Ok(ExportedKeyMaterial {
        armored,
        base64: general_purpose::STANDARD.encode(bytes),
    })
}
