//! Key lifecycle scenarios: expiry, export, locking

mod common;

use anyhow::Result;
use chrono::Duration;
use pgpkeys::crypto::pgp::{public_key_expired, public_key_fingerprint, public_key_user_id};
use pgpkeys::{CiphertextEncoding, Crypto, KeyPair, LockState, PgpErrorKind, SecurePassphrase};

#[test]
fn test_key_without_expiry_never_expires() -> Result<()> {
    let key_pair = common::generate(1, 0)?;

    assert_eq!(key_pair.user_id(), "nameeee (commentttt) <emaillll>");
    assert!(key_pair.expires_at().is_none());
    assert!(!key_pair.is_expired(key_pair.created_at() + Duration::days(365 * 50)));
    Ok(())
}

#[test]
fn test_key_with_expiry_expires_after_lifetime() -> Result<()> {
    let key_pair = common::generate(2, 7)?;
    let created = key_pair.created_at();

    assert_eq!(key_pair.expires_at(), Some(created + Duration::days(7)));
    assert!(!key_pair.is_expired(created + Duration::days(1)));
    assert!(key_pair.is_expired(created + Duration::days(14)));

    let public_key = key_pair.public_key();
    assert!(!public_key_expired(&public_key, created + Duration::days(1)));
    assert!(public_key_expired(&public_key, created + Duration::days(14)));
    Ok(())
}

#[test]
fn test_expiry_range_bounds() -> Result<()> {
    let shortest = common::generate(6, 1)?;
    let created = shortest.created_at();
    assert!(!shortest.is_expired(created));
    assert!(shortest.is_expired(created + Duration::days(2)));

    let longest = common::generate(7, 1000)?;
    let created = longest.created_at();
    assert_eq!(longest.expires_at(), Some(created + Duration::days(1000)));
    assert!(!longest.is_expired(created + Duration::days(2)));
    assert!(longest.is_expired(created + Duration::days(1001)));
    Ok(())
}

#[test]
fn test_expiry_survives_export_and_reparse() -> Result<()> {
    let key_pair = common::generate(8, 7)?;
    let expires_at = key_pair.expires_at();
    assert!(expires_at.is_some());
    let mut exporter = common::exporter(8);
    let public = exporter.export_public(&key_pair)?;

    let (key_pair, unlocked) = exporter.export_private(key_pair, &SecurePassphrase::empty())?;
    let (_, locked) = exporter.export_private(key_pair, &SecurePassphrase::new("pw1")?)?;

    for armored in [&unlocked.armored, &locked.armored] {
        let reparsed = KeyPair::from_armored(armored)?;
        assert_eq!(reparsed.expires_at(), expires_at);
        assert!(reparsed.is_expired(reparsed.created_at() + Duration::days(14)));
    }
    let reparsed = KeyPair::from_base64(&unlocked.base64)?;
    assert_eq!(reparsed.expires_at(), expires_at);

    let public_key = Crypto::load_public_key(&public.base64)?;
    let created = KeyPair::from_armored(&unlocked.armored)?.created_at();
    assert!(!public_key_expired(&public_key, created + Duration::days(2)));
    assert!(public_key_expired(&public_key, created + Duration::days(14)));
    Ok(())
}

#[test]
fn test_exported_public_key_keeps_identity() -> Result<()> {
    let key_pair = common::generate(3, 0)?;
    let exported = common::exporter(3).export_public(&key_pair)?;

    let from_armor = Crypto::load_public_key(&exported.armored)?;
    let from_base64 = Crypto::load_public_key(&exported.base64)?;

    assert_eq!(public_key_fingerprint(&from_armor), key_pair.fingerprint());
    assert_eq!(public_key_fingerprint(&from_base64), key_pair.fingerprint());
    assert_eq!(public_key_user_id(&from_armor), key_pair.user_id());
    Ok(())
}

#[test]
fn test_locked_export_round_trip() -> Result<()> {
    let key_pair = common::generate(4, 0)?;
    let passphrase = SecurePassphrase::new("pw1")?;

    let (locked, exported) = common::exporter(4).export_private(key_pair, &passphrase)?;
    assert_eq!(locked.lock_state(), LockState::Locked);

    let reloaded = KeyPair::from_armored(&exported.armored)?;
    assert!(reloaded.is_locked());
    assert_eq!(reloaded.fingerprint(), locked.fingerprint());

    let ciphertext = common::cipher(40)
        .encrypt(&reloaded.public_key(), b"hello world")?
        .into_ciphertext();

    let err = common::cipher(41)
        .decrypt(&reloaded, &SecurePassphrase::empty(), &ciphertext, CiphertextEncoding::Armored)
        .unwrap_err();
    assert_eq!(err.kind(), PgpErrorKind::Decryption);

    let plaintext = common::cipher(42).decrypt(
        &reloaded,
        &passphrase,
        &ciphertext,
        CiphertextEncoding::Armored,
    )?;
    assert_eq!(plaintext, b"hello world");

    let unlocked = reloaded.unlock(&passphrase)?;
    assert_eq!(unlocked.lock_state(), LockState::Unlocked);
    Ok(())
}

#[test]
fn test_wrong_unlock_passphrase_keeps_key_locked() -> Result<()> {
    let key_pair = common::generate(5, 0)?;
    let (locked, _) =
        common::exporter(5).export_private(key_pair, &SecurePassphrase::new("pw1")?)?;

    let err = locked.unlock(&SecurePassphrase::new("pw2")?).unwrap_err();
    assert_eq!(err.kind(), PgpErrorKind::Decryption);
    assert!(locked.is_locked());
    Ok(())
}
