//! PGP key generation and lock-state management using rPGP 0.16

use crate::crypto::error::{PgpError, Result};
use crate::crypto::pgp::identity::Identity;
use crate::crypto::pgp::passphrase::SecurePassphrase;
use chrono::{DateTime, Utc};
use pgp::composed::{
    Deserializable, KeyType, SecretKeyParamsBuilder, SignedPublicKey, SignedSecretKey,
    SubkeyParamsBuilder,
};
use pgp::packet::{Signature, Subpacket, SubpacketData};
use pgp::types::{KeyDetails, Password, PublicKeyTrait, SecretParams, Tag};
use rand::rngs::ThreadRng;
use rand::{CryptoRng, Rng};

/// RSA modulus size used for the primary key and the encryption subkey.
pub const RSA_BITS: u32 = 2048;
/// Shortest accepted key lifetime in days (0 means "never expires").
pub const EXPIRY_DAYS_MIN: u32 = 1;
/// Longest accepted key lifetime in days.
pub const EXPIRY_DAYS_MAX: u32 = 1_000;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Whether the private key material is protected by a passphrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Locked,
}

impl std::fmt::Display for LockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockState::Unlocked => f.write_str("unlocked"),
            LockState::Locked => f.write_str("locked"),
        }
    }
}

/// A signed OpenPGP secret key with its identity binding.
///
/// Lock transitions never mutate a pair in place: [`KeyPair::lock`] consumes
/// the unlocked pair and [`KeyPair::unlock`] returns a fresh one.
#[derive(Debug, Clone)]
pub struct KeyPair {
    secret_key: SignedSecretKey,
    identity: Option<Identity>,
    user_id: String,
    fingerprint: String,
    requested_lock: SecurePassphrase,
}

impl KeyPair {
    fn from_signed(
        secret_key: SignedSecretKey,
        identity: Option<Identity>,
        requested_lock: SecurePassphrase,
    ) -> Self {
        let user_id = user_id_string(secret_key.details.users.first().map(|u| u.id.id().to_vec()));
        let fingerprint = hex::encode(secret_key.fingerprint().as_bytes());
        Self {
            secret_key,
            identity,
            user_id,
            fingerprint,
            requested_lock,
        }
    }

    /// Parse an armored `PGP PRIVATE KEY BLOCK` and verify its self-signatures.
    pub fn from_armored(armored: &str) -> Result<Self> {
        ensure_armor_block(armored, "PGP PRIVATE KEY BLOCK")?;
        let (secret_key, _) = SignedSecretKey::from_string(armored)
            .map_err(|e| PgpError::Decoding(format!("failed to parse private key: {}", e)))?;
        Self::from_parsed(secret_key)
    }

    /// Parse a base64-encoded binary private key and verify its self-signatures.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = crate::crypto::pgp::decode_base64(encoded)?;
        let secret_key = SignedSecretKey::from_bytes(bytes.as_slice())
            .map_err(|e| PgpError::Decoding(format!("failed to parse private key: {}", e)))?;
        Self::from_parsed(secret_key)
    }

    fn from_parsed(secret_key: SignedSecretKey) -> Result<Self> {
        secret_key
            .verify()
            .map_err(|e| PgpError::Decoding(format!("invalid key self-signature: {}", e)))?;
        Ok(Self::from_signed(
            secret_key,
            None,
            SecurePassphrase::empty(),
        ))
    }

    /// The underlying rPGP secret key.
    pub fn secret_key(&self) -> &SignedSecretKey {
        &self.secret_key
    }

    /// Public half of this key pair.
    pub fn public_key(&self) -> SignedPublicKey {
        SignedPublicKey::from(self.secret_key.clone())
    }

    /// Identity the pair was generated for, when generated by this crate.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// The primary OpenPGP user id.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Lowercase hex fingerprint of the primary key.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Passphrase requested at generation time, applied when the private
    /// key is exported.
    pub fn requested_lock(&self) -> &SecurePassphrase {
        &self.requested_lock
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.secret_key.primary_key.public_key().created_at().clone()
    }

    /// Point in time the primary key stops being valid, if it has a lifetime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let users = &self.secret_key.details.users;
        key_expires_at(
            self.created_at(),
            users.first().map(|u| u.signatures.as_slice()).unwrap_or_default(),
        )
    }

    pub fn lock_state(&self) -> LockState {
        let primary_locked = is_encrypted(self.secret_key.primary_key.secret_params());
        if primary_locked {
            LockState::Locked
        } else {
            LockState::Unlocked
        }
    }

    pub fn is_locked(&self) -> bool {
        self.lock_state() == LockState::Locked
    }

    /// See [`is_expired`].
    pub fn is_expired(&self, at: DateTime<Utc>) -> bool {
        is_expired(self, at)
    }

    /// Protect the primary key and every subkey with `passphrase`.
    ///
    /// Consumes the unlocked pair. Fails with [`PgpError::Lock`] when the
    /// pair is already locked or the passphrase is empty.
    pub fn lock<R: Rng + CryptoRng>(
        self,
        rng: &mut R,
        passphrase: &SecurePassphrase,
    ) -> Result<KeyPair> {
        if passphrase.is_empty() {
            return Err(PgpError::Lock("cannot lock with an empty passphrase".into()));
        }
        if self.is_locked() {
            return Err(PgpError::Lock(format!(
                "key {} is already locked; unlock it before changing the passphrase",
                self.fingerprint
            )));
        }

        let password = passphrase.to_pgp_password();
        let mut secret_key = self.secret_key;
        secret_key
            .primary_key
            .set_password(&mut *rng, &password)
            .map_err(|e| PgpError::Lock(format!("failed to lock primary key: {}", e)))?;
        for subkey in secret_key.secret_subkeys.iter_mut() {
            subkey
                .key
                .set_password(&mut *rng, &password)
                .map_err(|e| PgpError::Lock(format!("failed to lock subkey: {}", e)))?;
        }

        log::info!("Locked private key {}", self.fingerprint);
        Ok(KeyPair {
            secret_key,
            identity: self.identity,
            user_id: self.user_id,
            fingerprint: self.fingerprint,
            requested_lock: self.requested_lock,
        })
    }

    /// Return an unlocked copy of this pair.
    ///
    /// A wrong or missing passphrase fails with [`PgpError::Decryption`];
    /// `self` keeps its lock state either way.
    pub fn unlock(&self, passphrase: &SecurePassphrase) -> Result<KeyPair> {
        if !self.is_locked() {
            log::debug!("Key {} is not locked, nothing to unlock", self.fingerprint);
            return Ok(self.clone());
        }

        let password = passphrase.to_pgp_password();
        let mut unlocked = self.clone();
        unlocked
            .secret_key
            .primary_key
            .remove_password(&password)
            .map_err(|e| PgpError::Decryption(format!("failed to unlock primary key: {}", e)))?;
        for subkey in unlocked.secret_key.secret_subkeys.iter_mut() {
            if is_encrypted(subkey.key.secret_params()) {
                subkey
                    .key
                    .remove_password(&password)
                    .map_err(|e| PgpError::Decryption(format!("failed to unlock subkey: {}", e)))?;
            }
        }

        log::info!("Unlocked private key {}", self.fingerprint);
        Ok(unlocked)
    }
}

/// Generates RSA key pairs bound to an [`Identity`].
///
/// Randomness is drawn from the injected generator only.
pub struct KeyGenerator<R = ThreadRng> {
    rng: R,
}

impl Default for KeyGenerator<ThreadRng> {
    fn default() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl<R: Rng + CryptoRng> KeyGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Generate a self-certified key pair.
    ///
    /// Creates:
    /// - RSA-2048 primary key (certification and signing)
    /// - RSA-2048 encryption subkey
    ///
    /// `expiry_days` of 0 means the key never expires; otherwise the
    /// self-signature carries a lifetime of `expiry_days` days.
    pub fn generate(
        &mut self,
        identity: &Identity,
        expiry_days: u32,
        passphrase: &SecurePassphrase,
    ) -> Result<KeyPair> {
        validate_expiry_days(expiry_days)?;
        let user_id = identity.user_id();
        log::info!(
            "Generating RSA-{} PGP keypair for user: {}",
            RSA_BITS,
            user_id
        );

        let mut encryptkey = SubkeyParamsBuilder::default();
        encryptkey
            .key_type(KeyType::Rsa(RSA_BITS))
            .can_sign(false)
            .can_encrypt(true)
            .can_authenticate(false);

        let mut key_params = SecretKeyParamsBuilder::default();
        key_params
            .key_type(KeyType::Rsa(RSA_BITS))
            .can_certify(true)
            .can_sign(true)
            .can_encrypt(false)
            .primary_user_id(user_id.clone())
            .subkeys(vec![encryptkey.build().map_err(|e| {
                PgpError::Generation(format!("Failed to build encryption subkey: {}", e))
            })?]);

        let secret_key_params = key_params
            .build()
            .map_err(|e| PgpError::Generation(format!("Failed to build secret key params: {}", e)))?;
        let secret_key = secret_key_params
            .generate(&mut self.rng)
            .map_err(|e| PgpError::Generation(format!("Failed to generate secret key: {}", e)))?;

        let mut signed_secret_key = secret_key
            .sign(&mut self.rng, &Password::empty())
            .map_err(|e| PgpError::Signing(format!("Failed to sign secret key: {}", e)))?;

        if let Some(lifetime) = key_lifetime(expiry_days) {
            bind_key_lifetime(&mut signed_secret_key, lifetime)?;
        }

        if signed_secret_key.details.users.iter().all(|u| u.signatures.is_empty()) {
            return Err(PgpError::Signing(format!(
                "identity binding for {} carries no self-signature",
                user_id
            )));
        }

        let key_pair = KeyPair::from_signed(
            signed_secret_key,
            Some(identity.clone()),
            passphrase.clone(),
        );
        log::info!(
            "Successfully generated PGP keypair {} for user: {}",
            key_pair.fingerprint(),
            user_id
        );
        Ok(key_pair)
    }
}

/// Parse an armored `PGP PUBLIC KEY BLOCK` and verify its self-signatures.
pub fn parse_public_key(armored: &str) -> Result<SignedPublicKey> {
    ensure_armor_block(armored, "PGP PUBLIC KEY BLOCK")?;
    let (public_key, _) = SignedPublicKey::from_string(armored)
        .map_err(|e| PgpError::Decoding(format!("Failed to parse PGP public key: {}", e)))?;
    verify_public_key(public_key)
}

/// Parse a base64-encoded binary public key and verify its self-signatures.
pub fn parse_public_key_base64(encoded: &str) -> Result<SignedPublicKey> {
    let bytes = crate::crypto::pgp::decode_base64(encoded)?;
    let public_key = SignedPublicKey::from_bytes(bytes.as_slice())
        .map_err(|e| PgpError::Decoding(format!("Failed to parse PGP public key: {}", e)))?;
    verify_public_key(public_key)
}

/// Lowercase hex fingerprint of a public key's primary key.
pub fn public_key_fingerprint(public_key: &SignedPublicKey) -> String {
    hex::encode(public_key.fingerprint().as_bytes())
}

/// Primary user id of a public key.
pub fn public_key_user_id(public_key: &SignedPublicKey) -> String {
    user_id_string(public_key.details.users.first().map(|u| u.id.id().to_vec()))
}

fn user_id_string(id: Option<Vec<u8>>) -> String {
    id.map(|bytes| String::from_utf8_lossy(&bytes).to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn verify_public_key(public_key: SignedPublicKey) -> Result<SignedPublicKey> {
    public_key
        .verify()
        .map_err(|e| PgpError::Decoding(format!("invalid key self-signature: {}", e)))?;
    Ok(public_key)
}

/// Reject expiry values outside `0` or `EXPIRY_DAYS_MIN..=EXPIRY_DAYS_MAX`.
pub fn validate_expiry_days(expiry_days: u32) -> Result<()> {
    if expiry_days == 0 || (EXPIRY_DAYS_MIN..=EXPIRY_DAYS_MAX).contains(&expiry_days) {
        Ok(())
    } else {
        Err(PgpError::Validation(format!(
            "expiry must be 0 or between {} and {} days, got {}",
            EXPIRY_DAYS_MIN, EXPIRY_DAYS_MAX, expiry_days
        )))
    }
}

fn key_lifetime(expiry_days: u32) -> Option<chrono::Duration> {
    (expiry_days > 0).then(|| chrono::Duration::seconds(i64::from(expiry_days) * SECONDS_PER_DAY))
}

/// Re-certify every user id with a hashed key-expiration subpacket.
///
/// The existing self-signature config is reused so key flags and algorithm
/// preferences stay as generated.
fn bind_key_lifetime(key: &mut SignedSecretKey, lifetime: chrono::Duration) -> Result<()> {
    let primary = &key.primary_key;
    let primary_public = primary.public_key();

    for user in key.details.users.iter_mut() {
        let mut config = user
            .signatures
            .first()
            .and_then(|sig| sig.config())
            .cloned()
            .ok_or_else(|| {
                PgpError::Signing(format!(
                    "user id {} has no self-signature to extend",
                    String::from_utf8_lossy(user.id.id())
                ))
            })?;

        config
            .hashed_subpackets
            .retain(|subpkt| !matches!(subpkt.data, SubpacketData::KeyExpirationTime(_)));
        config.hashed_subpackets.push(
            Subpacket::regular(SubpacketData::KeyExpirationTime(lifetime))
                .map_err(|e| PgpError::Signing(format!("Failed to encode key lifetime: {}", e)))?,
        );

        let signature = config
            .sign_certification(primary, &primary_public, &Password::empty(), Tag::UserId, &user.id)
            .map_err(|e| PgpError::Signing(format!("Failed to certify user id: {}", e)))?;
        user.signatures = vec![signature];
    }

    log::debug!("Bound a key lifetime of {} days", lifetime.num_days());
    Ok(())
}

/// Whether the key pair is expired at `at`.
///
/// True when the primary key lifetime recorded in its self-signature has
/// elapsed, or when that self-signature has itself expired.
pub fn is_expired(key_pair: &KeyPair, at: DateTime<Utc>) -> bool {
    let users = &key_pair.secret_key.details.users;
    expired_at(
        key_pair.created_at(),
        users.first().map(|u| u.signatures.as_slice()).unwrap_or_default(),
        at,
    )
}

/// [`is_expired`] for a public key, e.g. one parsed from armor.
pub fn public_key_expired(public_key: &SignedPublicKey, at: DateTime<Utc>) -> bool {
    let users = &public_key.details.users;
    expired_at(
        public_key.primary_key.created_at().clone(),
        users.first().map(|u| u.signatures.as_slice()).unwrap_or_default(),
        at,
    )
}

fn expired_at(created: DateTime<Utc>, self_signatures: &[Signature], at: DateTime<Utc>) -> bool {
    let key_expired = key_expires_at(created, self_signatures).is_some_and(|expiry| expiry <= at);
    let signature_expired = newest(self_signatures)
        .and_then(signature_expires_at)
        .is_some_and(|expiry| expiry <= at);
    key_expired || signature_expired
}

fn key_expires_at(created: DateTime<Utc>, self_signatures: &[Signature]) -> Option<DateTime<Utc>> {
    let signature = newest(self_signatures)?;
    let lifetime = hashed_subpacket(signature, |data| match data {
        SubpacketData::KeyExpirationTime(d) => Some(d.clone()),
        _ => None,
    })?;
    if lifetime == chrono::Duration::zero() {
        return None;
    }
    created.checked_add_signed(lifetime)
}

fn signature_expires_at(signature: &Signature) -> Option<DateTime<Utc>> {
    let created = signature_created_at(signature)?;
    let lifetime = hashed_subpacket(signature, |data| match data {
        SubpacketData::SignatureExpirationTime(d) => Some(d.clone()),
        _ => None,
    })?;
    if lifetime == chrono::Duration::zero() {
        return None;
    }
    created.checked_add_signed(lifetime)
}

fn signature_created_at(signature: &Signature) -> Option<DateTime<Utc>> {
    hashed_subpacket(signature, |data| match data {
        SubpacketData::SignatureCreationTime(dt) => Some(dt.clone()),
        _ => None,
    })
}

fn newest(signatures: &[Signature]) -> Option<&Signature> {
    signatures
        .iter()
        .max_by_key(|sig| signature_created_at(sig).map(|dt| dt.timestamp()).unwrap_or_default())
}

fn hashed_subpacket<T>(
    signature: &Signature,
    select: impl Fn(&SubpacketData) -> Option<T>,
) -> Option<T> {
    signature
        .config()
        .and_then(|config| config.hashed_subpackets.iter().find_map(|subpkt| select(&subpkt.data)))
}

fn is_encrypted(params: &SecretParams) -> bool {
    matches!(params, SecretParams::Encrypted(_))
}

/// Check that `input` is framed as a single `-----BEGIN <label>-----` block.
pub(crate) fn ensure_armor_block(input: &str, label: &str) -> Result<()> {
    let begin = format!("-----BEGIN {}-----", label);
    let end = format!("-----END {}-----", label);
    let trimmed = input.trim_start();

    if !trimmed.starts_with("-----BEGIN ") {
        return Err(PgpError::Decoding(format!(
            "input is not ASCII-armored, expected {}",
            begin
        )));
    }
    if !trimmed.starts_with(&begin) {
        let found = trimmed.lines().next().unwrap_or_default();
        return Err(PgpError::Decoding(format!(
            "wrong armor block type: expected {}, found {}",
            begin, found
        )));
    }
    if !trimmed.contains(&end) {
        return Err(PgpError::Decoding(format!("armor block is missing {}", end)));
    }
    Ok(())
}
