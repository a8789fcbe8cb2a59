use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in citpass.
#[derive(Debug, Error)]
pub enum CitpassError {
    // --- Configuration errors ---
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Password store is not initialized at {0} — run `citpass init` first")]
    NotInitialized(PathBuf),

    // --- Crypto errors ---
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Authentication failed — wrong master password or forged/corrupted data")]
    AuthenticationFailed,

    // --- Storage errors ---
    #[error("{}: sealed payload is {size} bytes, above the {limit}-byte limit", path.display())]
    SizeLimitExceeded { path: PathBuf, size: u64, limit: u64 },

    #[error("Could not allocate memory: {0}")]
    AllocationFailed(String),

    #[error("Invalid sealed file: {0}")]
    InvalidBlobFormat(String),

    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    #[error("Entry file '{0}' already exists")]
    IdentifierCollision(String),

    // --- Entry errors ---
    #[error("No entry titled '{0}'")]
    EntryNotFound(String),

    #[error("An entry titled '{0}' already exists")]
    DuplicateTitle(String),

    #[error("Invalid title: {0}")]
    InvalidTitle(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,

    #[error("Password mismatch — passwords do not match")]
    PasswordMismatch,
}

/// Convenience type alias for citpass results.
pub type Result<T> = std::result::Result<T, CitpassError>;
