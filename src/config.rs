//! Runtime configuration loaded from the environment.

use anyhow::{anyhow, Result};
use std::path::PathBuf;

use crate::crypto::pgp::keypair::validate_expiry_days;

pub const OUTPUT_DIR_VAR: &str = "PGPKEYS_OUTPUT_DIR";
pub const DEFAULT_EXPIRY_VAR: &str = "PGPKEYS_DEFAULT_EXPIRY_DAYS";
pub const LOG_FILE_VAR: &str = "PGPKEYS_LOG_FILE";

const DEFAULT_OUTPUT_DIR: &str = "keys";

/// Settings for the command-line front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory generated keys are written under.
    pub output_dir: PathBuf,
    /// Lifetime applied when `generate` is run without `--expiry`.
    pub default_expiry_days: u32,
    /// Optional file log lines are mirrored to.
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            default_expiry_days: 0,
            log_file: None,
        }
    }
}

impl Config {
    /// Load from the process environment (after `.env`, if present, has
    /// been applied by the caller).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Unset keys fall back to defaults;
    /// set but invalid values are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(dir) = lookup(OUTPUT_DIR_VAR).filter(|v| !v.trim().is_empty()) {
            config.output_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup(DEFAULT_EXPIRY_VAR).filter(|v| !v.trim().is_empty()) {
            let days: u32 = raw
                .trim()
                .parse()
                .map_err(|e| anyhow!("{} must be a number of days, got {:?}: {}", DEFAULT_EXPIRY_VAR, raw, e))?;
            validate_expiry_days(days)?;
            config.default_expiry_days = days;
        }

        config.log_file = lookup(LOG_FILE_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }
}
