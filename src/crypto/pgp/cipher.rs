//! Message encryption and decryption.

use crate::crypto::error::{PgpError, Result};
use crate::crypto::pgp::keypair::{ensure_armor_block, KeyPair};
use crate::crypto::pgp::passphrase::SecurePassphrase;
use crate::crypto::pgp::decode_base64;
use base64::{engine::general_purpose, Engine as _};
use pgp::composed::{Message, MessageBuilder, SignedPublicKey};
use pgp::crypto::sym::SymmetricKeyAlgorithm;
use pgp::packet::{Signature, SubpacketData};
use rand::rngs::ThreadRng;
use rand::{CryptoRng, Rng};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

const MESSAGE_LABEL: &str = "PGP MESSAGE";

/// How ciphertext handed to [`MessageCipher::decrypt`] is framed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CiphertextEncoding {
    /// ASCII-armored `PGP MESSAGE` block.
    #[default]
    Armored,
    /// Base64 wrapping of an armored or binary message.
    Base64,
}

impl CiphertextEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            CiphertextEncoding::Armored => "armored",
            CiphertextEncoding::Base64 => "base64",
        }
    }
}

impl fmt::Display for CiphertextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CiphertextEncoding {
    type Err = PgpError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "armored" => Ok(CiphertextEncoding::Armored),
            "base64" => Ok(CiphertextEncoding::Base64),
            other => Err(PgpError::Validation(format!(
                "encoding must be either 'armored' or 'base64', got: {}",
                other
            ))),
        }
    }
}

/// Ciphertext together with its framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedMessage {
    ciphertext: String,
    encoding: CiphertextEncoding,
}

impl EncryptedMessage {
    pub fn ciphertext(&self) -> &str {
        &self.ciphertext
    }

    pub fn encoding(&self) -> CiphertextEncoding {
        self.encoding
    }

    pub fn into_ciphertext(self) -> String {
        self.ciphertext
    }

    /// Wrap the armored text in base64, as accepted by
    /// [`CiphertextEncoding::Base64`].
    pub fn to_base64(&self) -> EncryptedMessage {
        match self.encoding {
            CiphertextEncoding::Base64 => self.clone(),
            CiphertextEncoding::Armored => EncryptedMessage {
                ciphertext: general_purpose::STANDARD.encode(self.ciphertext.as_bytes()),
                encoding: CiphertextEncoding::Base64,
            },
        }
    }
}

/// Encrypts to public keys and decrypts with private keys.
pub struct MessageCipher<R = ThreadRng> {
    rng: R,
}

impl Default for MessageCipher<ThreadRng> {
    fn default() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl<R: Rng + CryptoRng> MessageCipher<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Encrypt `plaintext` to the recipient's encryption key.
    ///
    /// Output is an armored SEIPD message with a fresh AES-256 session key,
    /// uncompressed. Two calls on the same input produce different bytes.
    pub fn encrypt(
        &mut self,
        public_key: &SignedPublicKey,
        plaintext: &[u8],
    ) -> Result<EncryptedMessage> {
        log::info!("Encrypting {} bytes of plaintext", plaintext.len());

        let mut builder = MessageBuilder::from_bytes("", plaintext.to_vec())
            .seipd_v1(&mut self.rng, SymmetricKeyAlgorithm::AES256);

        match public_key
            .public_subkeys
            .iter()
            .find(|subkey| has_encryption_flag(&subkey.signatures))
        {
            Some(subkey) => builder.encrypt_to_key(&mut self.rng, &subkey.key),
            None => {
                log::warn!("No encryption subkey found, encrypting to the primary key");
                builder.encrypt_to_key(&mut self.rng, &public_key.primary_key)
            }
        }
        .map_err(|e| PgpError::Encryption(format!("Failed to encrypt to key: {}", e)))?;

        let ciphertext = builder
            .to_armored_string(&mut self.rng, Default::default())
            .map_err(|e| PgpError::Encryption(format!("Failed to armor message: {}", e)))?;

        log::debug!("Produced {} bytes of armored ciphertext", ciphertext.len());
        Ok(EncryptedMessage {
            ciphertext,
            encoding: CiphertextEncoding::Armored,
        })
    }

    /// Decrypt `ciphertext` with `key_pair`.
    ///
    /// An empty `passphrase` means "no passphrase"; a locked key then fails
    /// with [`PgpError::Decryption`]. Framing problems fail with
    /// [`PgpError::Decoding`] or [`PgpError::WrongEncoding`] before any key
    /// material is touched.
    pub fn decrypt(
        &self,
        key_pair: &KeyPair,
        passphrase: &SecurePassphrase,
        ciphertext: &str,
        encoding: CiphertextEncoding,
    ) -> Result<Vec<u8>> {
        log::info!(
            "Decrypting {} ciphertext with key {}",
            encoding,
            key_pair.fingerprint()
        );

        let message = match decode(ciphertext, encoding)? {
            Framed::Armored(text) => Message::from_armor(Cursor::new(text.into_bytes()))
                .map(|(message, _headers)| message),
            Framed::Binary(bytes) => Message::from_bytes(Cursor::new(bytes)),
        }
        .map_err(|e| PgpError::Decoding(format!("Failed to parse PGP message: {}", e)))?;

        let mut message = message
            .decrypt(&passphrase.to_pgp_password(), key_pair.secret_key())
            .map_err(|e| PgpError::Decryption(format!("Failed to decrypt message: {}", e)))?;

        if message.is_compressed() {
            log::debug!("Decompressing decrypted message");
            message = message
                .decompress()
                .map_err(|e| PgpError::Decryption(format!("Failed to decompress: {}", e)))?;
        }

        let plaintext = message
            .as_data_vec()
            .map_err(|e| PgpError::Decryption(format!("Failed to read message body: {}", e)))?;

        log::info!("Decrypted {} bytes of plaintext", plaintext.len());
        Ok(plaintext)
    }
}

enum Framed {
    Armored(String),
    Binary(Vec<u8>),
}

fn decode(ciphertext: &str, encoding: CiphertextEncoding) -> Result<Framed> {
    let trimmed = ciphertext.trim();
    match encoding {
        CiphertextEncoding::Armored => {
            if !is_armored(trimmed) && decode_base64(trimmed).is_ok() {
                return Err(PgpError::WrongEncoding {
                    declared: CiphertextEncoding::Armored.to_string(),
                    actual: CiphertextEncoding::Base64.to_string(),
                });
            }
            ensure_armor_block(trimmed, MESSAGE_LABEL)?;
            Ok(Framed::Armored(trimmed.to_string()))
        }
        CiphertextEncoding::Base64 => {
            if is_armored(trimmed) {
                return Err(PgpError::WrongEncoding {
                    declared: CiphertextEncoding::Base64.to_string(),
                    actual: CiphertextEncoding::Armored.to_string(),
                });
            }
            let bytes = decode_base64(trimmed)?;
            match std::str::from_utf8(&bytes) {
                Ok(text) if is_armored(text.trim()) => {
                    ensure_armor_block(text.trim(), MESSAGE_LABEL)?;
                    Ok(Framed::Armored(text.trim().to_string()))
                }
                _ => {
                    // Every OpenPGP packet header has the high bit set.
                    if bytes.first().map_or(true, |b| b & 0x80 == 0) {
                        return Err(PgpError::Decoding(
                            "decoded base64 is neither armored text nor an OpenPGP packet stream"
                                .into(),
                        ));
                    }
                    Ok(Framed::Binary(bytes))
                }
            }
        }
    }
}

fn is_armored(text: &str) -> bool {
    text.starts_with("-----BEGIN ")
}

fn has_encryption_flag(signatures: &[Signature]) -> bool {
    signatures.iter().any(|sig| {
        sig.config().map_or(false, |config| {
            config.hashed_subpackets.iter().any(|subpkt| {
                matches!(
                    &subpkt.data,
                    SubpacketData::KeyFlags(flags) if flags.encrypt_comms() || flags.encrypt_storage()
                )
            })
        })
    })
}
