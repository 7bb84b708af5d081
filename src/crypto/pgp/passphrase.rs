//! Passphrases protecting private key material.

use crate::crypto::error::{PgpError, Result};
use pgp::types::Password;
use std::env::VarError;
use zeroize::ZeroizeOnDrop;

/// Shortest accepted non-empty passphrase, in characters.
pub const PASSPHRASE_MIN_LEN: usize = 1;
/// Longest accepted passphrase, in characters.
pub const PASSPHRASE_MAX_LEN: usize = 100;

/// Secure passphrase for PGP operations.
///
/// The empty passphrase means "no lock". Implements ZeroizeOnDrop to clear
/// the secret from memory when dropped.
#[derive(Clone, Default, ZeroizeOnDrop)]
pub struct SecurePassphrase {
    passphrase: String,
}

impl SecurePassphrase {
    /// Create a passphrase, rejecting values longer than
    /// [`PASSPHRASE_MAX_LEN`] characters.
    pub fn new(passphrase: impl Into<String>) -> Result<Self> {
        let passphrase = passphrase.into();
        let len = passphrase.chars().count();
        if len > PASSPHRASE_MAX_LEN {
            return Err(PgpError::Validation(format!(
                "passphrase must be between {} and {} characters, got {}",
                PASSPHRASE_MIN_LEN, PASSPHRASE_MAX_LEN, len
            )));
        }
        Ok(Self { passphrase })
    }

    /// The "no passphrase" value.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read a passphrase from the terminal with echo disabled.
    pub fn from_user_input_with_prompt(prompt: &str) -> anyhow::Result<Self> {
        use std::io::{self, Write};

        print!("{}: ", prompt);
        io::stdout().flush()?;

        let passphrase = rpassword::read_password()
            .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))?;
        Ok(Self::new(passphrase)?)
    }

    /// Read a passphrase from the named environment variable.
    ///
    /// Naming a variable is a request for a lock, so an unset, empty or
    /// non-UTF-8 variable fails with [`PgpError::Validation`].
    pub fn from_env(var: &str) -> Result<Self> {
        Self::from_env_value(var, std::env::var(var))
    }

    fn from_env_value(var: &str, value: std::result::Result<String, VarError>) -> Result<Self> {
        match value {
            Ok(value) if value.is_empty() => Err(PgpError::Validation(format!(
                "passphrase variable {} is empty",
                var
            ))),
            Ok(value) => Self::new(value),
            Err(VarError::NotPresent) => Err(PgpError::Validation(format!(
                "passphrase variable {} is not set",
                var
            ))),
            Err(VarError::NotUnicode(_)) => Err(PgpError::Validation(format!(
                "passphrase variable {} is not valid UTF-8",
                var
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.passphrase.is_empty()
    }

    /// Get the passphrase as a string slice.
    pub fn as_str(&self) -> &str {
        &self.passphrase
    }

    /// Convert to the rPGP password type.
    pub fn to_pgp_password(&self) -> Password {
        if self.is_empty() {
            Password::empty()
        } else {
            Password::from(self.passphrase.as_str())
        }
    }
}

impl std::fmt::Debug for SecurePassphrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurePassphrase")
            .field("empty", &self.is_empty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_passphrase() {
        let passphrase = SecurePassphrase::new("").unwrap();
        assert!(passphrase.is_empty());
        assert_eq!(passphrase.as_str(), "");
    }

    #[test]
    fn test_length_limits() {
        assert!(SecurePassphrase::new("a").is_ok());
        assert!(SecurePassphrase::new("a".repeat(PASSPHRASE_MAX_LEN)).is_ok());

        let err = SecurePassphrase::new("a".repeat(PASSPHRASE_MAX_LEN + 1)).unwrap_err();
        assert!(matches!(err, PgpError::Validation(_)));
    }

    #[test]
    fn test_length_counts_characters() {
        let passphrase = "ü".repeat(PASSPHRASE_MAX_LEN);
        assert!(SecurePassphrase::new(passphrase).is_ok());
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let passphrase = SecurePassphrase::new("hunter2").unwrap();
        let rendered = format!("{:?}", passphrase);
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_from_missing_env_fails() {
        let err = SecurePassphrase::from_env("PGPKEYS_TEST_UNSET_PASSPHRASE").unwrap_err();
        assert!(matches!(err, PgpError::Validation(_)));
    }

    #[test]
    fn test_from_env_value_rejects_empty_and_non_unicode() {
        let err = SecurePassphrase::from_env_value("VAR", Ok(String::new())).unwrap_err();
        assert!(matches!(err, PgpError::Validation(_)));

        let non_unicode = VarError::NotUnicode(std::ffi::OsString::from("pw"));
        let err = SecurePassphrase::from_env_value("VAR", Err(non_unicode)).unwrap_err();
        assert!(matches!(err, PgpError::Validation(_)));
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_from_env_value_accepts_set_value() {
        let passphrase = SecurePassphrase::from_env_value("VAR", Ok("pw1".into())).unwrap();
        assert_eq!(passphrase.as_str(), "pw1");
    }
}
