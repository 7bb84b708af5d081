//! Test utilities for pgpkeys
//!
//! Seeded random sources and cached key pairs, so unit tests stay
//! deterministic and do not pay for RSA generation more than once.

pub mod pgp_test_keys;

pub use pgp_test_keys::*;
