//! PGP key generation utilities for testing

use crate::crypto::pgp::{
    Identity, KeyExporter, KeyGenerator, KeyPair, MessageCipher, SecurePassphrase,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::OnceLock;

/// Deterministic RNG for tests.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn seeded_generator(seed: u64) -> KeyGenerator<StdRng> {
    KeyGenerator::new(seeded_rng(seed))
}

pub fn seeded_exporter(seed: u64) -> KeyExporter<StdRng> {
    KeyExporter::new(seeded_rng(seed))
}

pub fn seeded_cipher(seed: u64) -> MessageCipher<StdRng> {
    MessageCipher::new(seeded_rng(seed))
}

/// Identity used throughout the unit tests.
pub fn test_identity() -> Identity {
    Identity::new("nameeee", "commentttt", "emaillll").expect("valid test identity")
}

/// Shared unlocked key pair without expiry, generated once per test binary.
pub fn unlocked_key() -> KeyPair {
    static KEY: OnceLock<KeyPair> = OnceLock::new();
    KEY.get_or_init(|| {
        seeded_generator(42)
            .generate(&test_identity(), 0, &SecurePassphrase::empty())
            .expect("test key generation")
    })
    .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlocked_key_is_cached() {
        assert_eq!(unlocked_key().fingerprint(), unlocked_key().fingerprint());
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        use rand::Rng;
        let a: u64 = seeded_rng(9).gen();
        let b: u64 = seeded_rng(9).gen();
        assert_eq!(a, b);
    }
}
