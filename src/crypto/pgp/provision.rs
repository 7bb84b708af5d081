//! One-shot creation of an exportable key: generate, export, lock.

use crate::crypto::error::Result;
use crate::crypto::pgp::export::{ExportedKeyMaterial, KeyExporter};
use crate::crypto::pgp::identity::Identity;
use crate::crypto::pgp::keypair::{KeyGenerator, KeyPair};
use crate::crypto::pgp::passphrase::SecurePassphrase;
use rand::{CryptoRng, Rng};

/// Everything a caller persists for a newly created key.
#[derive(Debug, Clone)]
pub struct ProvisionedKey {
    /// Lowercase hex fingerprint, used as the key's identifier.
    pub fingerprint: String,
    pub public: ExportedKeyMaterial,
    pub private: ExportedKeyMaterial,
    /// Locked whenever a passphrase was requested.
    pub key_pair: KeyPair,
}

/// Generate a key pair and render both halves, locking the private half
/// with `passphrase` when it is non-empty.
pub fn provision<G, E>(
    generator: &mut KeyGenerator<G>,
    exporter: &mut KeyExporter<E>,
    identity: &Identity,
    expiry_days: u32,
    passphrase: &SecurePassphrase,
) -> Result<ProvisionedKey>
where
    G: Rng + CryptoRng,
    E: Rng + CryptoRng,
{
    let key_pair = generator.generate(identity, expiry_days, passphrase)?;
    let public = exporter.export_public(&key_pair)?;

    let requested_lock = key_pair.requested_lock().clone();
    let (key_pair, private) = exporter.export_private(key_pair, &requested_lock)?;

    Ok(ProvisionedKey {
        fingerprint: key_pair.fingerprint().to_string(),
        public,
        private,
        key_pair,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::pgp::keypair::LockState;
    use crate::test_utils::pgp_test_keys::{seeded_exporter, seeded_generator, test_identity};

    #[test]
    fn test_provision_with_passphrase() {
        let mut generator = seeded_generator(21);
        let mut exporter = seeded_exporter(21);
        let passphrase = SecurePassphrase::new("password123").unwrap();

        let provisioned = provision(
            &mut generator,
            &mut exporter,
            &test_identity(),
            0,
            &passphrase,
        )
        .unwrap();

        assert_eq!(provisioned.key_pair.lock_state(), LockState::Locked);
        assert_eq!(provisioned.fingerprint, provisioned.key_pair.fingerprint());
        assert!(provisioned
            .public
            .armored
            .contains("BEGIN PGP PUBLIC KEY BLOCK"));
        assert!(provisioned
            .private
            .armored
            .contains("BEGIN PGP PRIVATE KEY BLOCK"));

        let reparsed = KeyPair::from_armored(&provisioned.private.armored).unwrap();
        assert!(reparsed.is_locked());
        assert!(reparsed.unlock(&passphrase).is_ok());
    }
}
