use std::path::Path;

use serde::Deserialize;

use crate::crypto::kdf::Argon2Params;
use crate::errors::{CitpassError, Result};

/// Store-level configuration, loaded from `<store>/citpass.toml`.
///
/// Every field has a sensible default so citpass works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Argon2 memory cost in KiB (default: 256 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 1).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// Length of generated entry file names (default: 50).
    #[serde(default = "default_identifier_length")]
    pub identifier_length: usize,

    /// Largest sealed file that will be read, in bytes (default: 1 MB).
    #[serde(default = "default_max_blob_bytes")]
    pub max_blob_bytes: u64,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_argon2_memory_kib() -> u32 {
    262_144 // 256 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    1
}

fn default_identifier_length() -> usize {
    50
}

fn default_max_blob_bytes() -> u64 {
    1_000_000
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            identifier_length: default_identifier_length(),
            max_blob_bytes: default_max_blob_bytes(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the store root.
    pub const FILE_NAME: &'static str = "citpass.toml";

    /// Shortest accepted identifier length.
    const MIN_IDENTIFIER_LEN: usize = 16;

    /// Longest accepted identifier length (well under NAME_MAX).
    const MAX_IDENTIFIER_LEN: usize = 128;

    /// Load settings from `<store_root>/citpass.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed or holds out-of-range
    /// values, an error is returned.
    pub fn load(store_root: &Path) -> Result<Self> {
        let config_path = store_root.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            CitpassError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the store cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.argon2_params()
            .validate()
            .map_err(|e| CitpassError::ConfigError(e.to_string()))?;

        if !(Self::MIN_IDENTIFIER_LEN..=Self::MAX_IDENTIFIER_LEN).contains(&self.identifier_length)
        {
            return Err(CitpassError::ConfigError(format!(
                "identifier_length must be within {}..={} (got {})",
                Self::MIN_IDENTIFIER_LEN,
                Self::MAX_IDENTIFIER_LEN,
                self.identifier_length
            )));
        }

        if self.max_blob_bytes == 0 {
            return Err(CitpassError::ConfigError(
                "max_blob_bytes must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
