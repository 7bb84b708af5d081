//! CLI Key Management - handles passphrase input and key files

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::crypto::pgp::{ProvisionedKey, SecurePassphrase};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

pub const PUBLIC_ARMORED_FILE: &str = "public.asc";
pub const PUBLIC_BASE64_FILE: &str = "public.b64";
pub const PRIVATE_ARMORED_FILE: &str = "private.asc";
pub const PRIVATE_BASE64_FILE: &str = "private.b64";

/// Where a passphrase comes from on the command line.
#[derive(Debug, Clone, Default)]
pub struct PassphraseSource {
    /// Name of an environment variable holding the passphrase.
    pub env_var: Option<String>,
    /// Prompt on the terminal instead.
    pub prompt: bool,
}

/// Handles key files and passphrase input at the CLI level
pub struct KeyManager;

impl KeyManager {
    /// Resolve a passphrase; no source means the empty passphrase.
    ///
    /// A named environment variable must hold a non-empty passphrase.
    pub fn resolve_passphrase(source: &PassphraseSource, prompt: &str) -> Result<SecurePassphrase> {
        if source.prompt {
            return SecurePassphrase::from_user_input_with_prompt(prompt);
        }
        match &source.env_var {
            Some(var) => SecurePassphrase::from_env(var)
                .with_context(|| format!("Cannot read passphrase from ${}", var)),
            None => Ok(SecurePassphrase::empty()),
        }
    }

    /// Write both halves of a provisioned key under `<base_dir>/<fingerprint>/`.
    ///
    /// Saves files with secure permissions:
    /// - Directory: 0o700 (owner rwx only)
    /// - Private key files: 0o600 (owner rw only)
    /// - Public key files: 0o644 (world readable)
    pub fn save_provisioned(base_dir: &Path, key: &ProvisionedKey) -> Result<PathBuf> {
        let key_dir = base_dir.join(&key.fingerprint);
        if key_dir.exists() {
            return Err(anyhow!(
                "Refusing to overwrite existing key directory {}",
                key_dir.display()
            ));
        }
        fs::create_dir_all(&key_dir)
            .with_context(|| format!("Failed to create {}", key_dir.display()))?;

        #[cfg(unix)]
        {
            let mut dir_perms = fs::metadata(&key_dir)?.permissions();
            dir_perms.set_mode(0o700);
            fs::set_permissions(&key_dir, dir_perms)?;
        }

        Self::write_file(&key_dir.join(PUBLIC_ARMORED_FILE), &key.public.armored, 0o644)?;
        Self::write_file(&key_dir.join(PUBLIC_BASE64_FILE), &key.public.base64, 0o644)?;
        Self::write_file(&key_dir.join(PRIVATE_ARMORED_FILE), &key.private.armored, 0o600)?;
        Self::write_file(&key_dir.join(PRIVATE_BASE64_FILE), &key.private.base64, 0o600)?;

        log::info!("Saved key {} to {}", key.fingerprint, key_dir.display());
        Ok(key_dir)
    }

    /// Read a key or message file as text.
    pub fn read_text(path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }

    #[cfg_attr(not(unix), allow(unused_variables))]
    fn write_file(path: &Path, contents: &str, mode: u32) -> Result<()> {
        fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;

        #[cfg(unix)]
        {
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(mode);
            fs::set_permissions(path, perms)?;
        }
        Ok(())
    }
}
