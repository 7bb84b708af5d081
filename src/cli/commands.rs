use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cli::key_manager::{KeyManager, PassphraseSource};
use crate::config::Config;
use crate::crypto::pgp::{
    provision, public_key_expired, public_key_fingerprint, public_key_user_id, CiphertextEncoding,
    Identity, KeyExporter, KeyGenerator,
};
use crate::crypto::Crypto;

#[derive(Parser)]
#[command(name = "pgpkeys")]
#[command(about = "pgpkeys - OpenPGP key pairs and message encryption")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PassphraseArgs {
    /// Read the passphrase from this environment variable
    #[arg(long, value_name = "VAR", conflicts_with = "prompt_passphrase")]
    pub passphrase_env: Option<String>,

    /// Prompt for the passphrase on the terminal
    #[arg(long)]
    pub prompt_passphrase: bool,
}

impl From<&PassphraseArgs> for PassphraseSource {
    fn from(args: &PassphraseArgs) -> Self {
        PassphraseSource {
            env_var: args.passphrase_env.clone(),
            prompt: args.prompt_passphrase,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a new key pair and write it to disk
    Generate {
        /// Name bound to the key
        #[arg(long)]
        name: String,
        /// Comment bound to the key
        #[arg(long, default_value = "")]
        comment: String,
        /// Email bound to the key
        #[arg(long)]
        email: String,
        /// Lifetime in days (0 = never expires)
        #[arg(long)]
        expiry: Option<u32>,
        #[command(flatten)]
        passphrase: PassphraseArgs,
        /// Output directory (overrides PGPKEYS_OUTPUT_DIR)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Encrypt a message to a public key
    Encrypt {
        /// Armored or base64 public key file
        #[arg(long)]
        public_key: PathBuf,
        /// Message text
        #[arg(long, conflicts_with = "input", required_unless_present = "input")]
        message: Option<String>,
        /// File holding the message
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Decrypt a message with a private key
    Decrypt {
        /// Armored or base64 private key file
        #[arg(long)]
        private_key: PathBuf,
        /// File holding the ciphertext
        #[arg(long)]
        ciphertext: PathBuf,
        /// Ciphertext encoding: armored or base64
        #[arg(long, default_value = "armored")]
        encoding: CiphertextEncoding,
        #[command(flatten)]
        passphrase: PassphraseArgs,
    },
    /// Show fingerprint, user id, lock state and expiry of a key
    Inspect {
        /// Armored or base64 key file, public or private
        #[arg(long)]
        key: PathBuf,
        /// Evaluate expiry at this RFC 3339 time instead of now
        #[arg(long)]
        at: Option<String>,
    },
}

pub struct CliApp {
    config: Config,
}

impl CliApp {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn generate(
        &self,
        identity: &Identity,
        expiry: Option<u32>,
        passphrase: &PassphraseArgs,
        out_dir: Option<PathBuf>,
        out: &mut impl Write,
    ) -> Result<PathBuf> {
        let expiry_days = expiry.unwrap_or(self.config.default_expiry_days);
        let passphrase = KeyManager::resolve_passphrase(
            &passphrase.into(),
            "Passphrase to lock the new private key (empty for none)",
        )?;

        info!("Generating key for {}", identity);
        let provisioned = provision(
            &mut KeyGenerator::default(),
            &mut KeyExporter::default(),
            identity,
            expiry_days,
            &passphrase,
        )
        .context("Failed to generate key pair")?;

        let base_dir = out_dir.unwrap_or_else(|| self.config.output_dir.clone());
        let key_dir = KeyManager::save_provisioned(&base_dir, &provisioned)?;

        writeln!(out, "{}", provisioned.fingerprint)?;
        info!(
            "Key {} written to {} ({})",
            provisioned.fingerprint,
            key_dir.display(),
            provisioned.key_pair.lock_state()
        );
        Ok(key_dir)
    }

    pub fn encrypt(
        &self,
        public_key_path: &Path,
        plaintext: &[u8],
        out: &mut impl Write,
    ) -> Result<String> {
        let public_key = Crypto::load_public_key(&KeyManager::read_text(public_key_path)?)
            .with_context(|| format!("Failed to load public key {}", public_key_path.display()))?;

        let (ciphertext, digest) = Crypto::encrypt_armored(&public_key, plaintext)?;
        info!("Encrypted message id: {}", digest);

        write!(out, "{}", ciphertext)?;
        Ok(digest)
    }

    pub fn decrypt(
        &self,
        private_key_path: &Path,
        ciphertext_path: &Path,
        encoding: CiphertextEncoding,
        passphrase: &PassphraseArgs,
        out: &mut impl Write,
    ) -> Result<String> {
        let key_pair = Crypto::load_private_key(&KeyManager::read_text(private_key_path)?)
            .with_context(|| format!("Failed to load private key {}", private_key_path.display()))?;
        let passphrase = KeyManager::resolve_passphrase(
            &passphrase.into(),
            "Passphrase to unlock the private key",
        )?;
        let ciphertext = KeyManager::read_text(ciphertext_path)?;

        let (plaintext, digest) = Crypto::decrypt(&key_pair, &passphrase, &ciphertext, encoding)?;
        info!("Decrypted message id: {}", digest);

        out.write_all(&plaintext)?;
        Ok(digest)
    }

    pub fn inspect(&self, key_path: &Path, at: Option<&str>, out: &mut impl Write) -> Result<()> {
        let at = match at {
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map_err(|e| anyhow!("Invalid --at time {:?}: {}", raw, e))?
                .with_timezone(&Utc),
            None => Utc::now(),
        };
        let text = KeyManager::read_text(key_path)?;

        let private = if text.contains("PRIVATE KEY BLOCK") {
            Some(Crypto::load_private_key(&text)?)
        } else if text.trim_start().starts_with("-----BEGIN ") {
            None
        } else {
            Crypto::load_private_key(&text).ok()
        };

        if let Some(key_pair) = private {
            writeln!(out, "fingerprint: {}", key_pair.fingerprint())?;
            writeln!(out, "user id:     {}", key_pair.user_id())?;
            writeln!(out, "lock state:  {}", key_pair.lock_state())?;
            match key_pair.expires_at() {
                Some(expiry) => writeln!(out, "expires:     {}", expiry.to_rfc3339())?,
                None => writeln!(out, "expires:     never")?,
            }
            writeln!(out, "expired:     {}", key_pair.is_expired(at))?;
        } else {
            let public_key = Crypto::load_public_key(&text)?;
            writeln!(out, "fingerprint: {}", public_key_fingerprint(&public_key))?;
            writeln!(out, "user id:     {}", public_key_user_id(&public_key))?;
            writeln!(out, "expired:     {}", public_key_expired(&public_key, at))?;
        }
        Ok(())
    }
}

pub fn run_cli(cli: Cli, config: Config) -> Result<()> {
    let app = CliApp::new(config);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Generate {
            name,
            comment,
            email,
            expiry,
            passphrase,
            out: out_dir,
        } => {
            let identity = Identity::new(name, comment, email)?;
            app.generate(&identity, expiry, &passphrase, out_dir, &mut out)?;
        }

        Commands::Encrypt {
            public_key,
            message,
            input,
        } => {
            let plaintext = match (message, input) {
                (Some(message), _) => message.into_bytes(),
                (None, Some(path)) => std::fs::read(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => return Err(anyhow!("Either --message or --input is required")),
            };
            app.encrypt(&public_key, &plaintext, &mut out)?;
        }

        Commands::Decrypt {
            private_key,
            ciphertext,
            encoding,
            passphrase,
        } => {
            app.decrypt(&private_key, &ciphertext, encoding, &passphrase, &mut out)?;
        }

        Commands::Inspect { key, at } => {
            app.inspect(&key, at.as_deref(), &mut out)?;
        }
    }

    out.flush()?;
    Ok(())
}
