//! Configuration: the `citpass.toml` settings file and the `StoreConfig`
//! handed to every storage call.

pub mod settings;

use std::fs;
use std::path::{Path, PathBuf};

use crate::crypto::kdf::Argon2Params;
use crate::errors::{CitpassError, Result};

pub use settings::Settings;

/// Name of the sealed index file inside the store root.
pub const INDEX_FILE_NAME: &str = "index";

/// Everything the storage layer needs to know about a store.
///
/// Built once by the CLI and passed down explicitly; nothing below the
/// CLI reads environment variables.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the index and one file per entry.
    pub root: PathBuf,

    /// KDF cost used for new seals.
    pub argon2: Argon2Params,

    /// Length of generated entry identifiers.
    pub identifier_len: usize,

    /// Largest sealed file that will be read.
    pub max_blob_bytes: u64,
}

impl StoreConfig {
    /// A config for `root` with default settings.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_settings(root, &Settings::default())
    }

    /// A config for `root` using the values in `settings`.
    pub fn from_settings(root: impl Into<PathBuf>, settings: &Settings) -> Self {
        Self {
            root: root.into(),
            argon2: settings.argon2_params(),
            identifier_len: settings.identifier_length,
            max_blob_bytes: settings.max_blob_bytes,
        }
    }

    /// Load `<root>/citpass.toml` (if any) and build the config from it.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let settings = Settings::load(&root)?;
        Ok(Self::from_settings(root, &settings))
    }

    /// Path of the sealed index file.
    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE_NAME)
    }

    /// Create the store root (mode 0700) if it does not exist yet.
    ///
    /// Returns `true` when the directory was created by this call.
    pub fn ensure_root(&self) -> Result<bool> {
        if self.root.is_dir() {
            return Ok(false);
        }
        if self.root.exists() {
            return Err(CitpassError::ConfigError(format!(
                "{} exists but is not a directory",
                self.root.display()
            )));
        }

        if let Some(parent) = self.root.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| creation_error(parent, e))?;
            }
        }

        create_private_dir(&self.root).map_err(|e| creation_error(&self.root, e))?;
        Ok(true)
    }
}

fn creation_error(path: &Path, e: std::io::Error) -> CitpassError {
    CitpassError::ConfigError(format!("cannot create {}: {e}", path.display()))
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

    fs::DirBuilder::new().mode(0o700).create(path)?;
    // The umask can only strip bits, but make the mode exact anyway.
    fs::set_permissions(path, fs::Permissions::from_mode(0o700))
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir(path)
}
