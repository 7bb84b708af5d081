//! Common test setup and utilities for integration tests

#![allow(dead_code)]

use anyhow::Result;
use pgpkeys::{Identity, KeyExporter, KeyGenerator, KeyPair, MessageCipher, SecurePassphrase};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Initialize test logging (safe to call from every test)
pub fn init_test_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_module("pgpkeys", log::LevelFilter::Debug)
        .try_init();
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn cipher(seed: u64) -> MessageCipher<StdRng> {
    MessageCipher::new(rng(seed))
}

pub fn exporter(seed: u64) -> KeyExporter<StdRng> {
    KeyExporter::new(rng(seed))
}

pub fn identity() -> Identity {
    Identity::new("nameeee", "commentttt", "emaillll").expect("valid identity")
}

/// Generate a key pair with a seeded RNG and no requested passphrase.
pub fn generate(seed: u64, expiry_days: u32) -> Result<KeyPair> {
    init_test_logging();
    let key_pair = KeyGenerator::new(rng(seed)).generate(
        &identity(),
        expiry_days,
        &SecurePassphrase::empty(),
    )?;
    Ok(key_pair)
}
