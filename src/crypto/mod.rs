//! Cryptographic primitives for citpass.
//!
//! This module provides:
//! - AES-256-GCM sealing and opening (`encryption`)
//! - Argon2id passphrase-based key derivation (`kdf`)
//! - The zeroizing `MasterKey` type (`keys`)

pub mod encryption;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{seal, open, derive_master_key, ...};
pub use encryption::{generate_nonce, open, seal, NONCE_LEN, TAG_LEN};
pub use kdf::{derive_master_key, generate_salt, Argon2Params, SALT_LEN};
pub use keys::{MasterKey, KEY_LEN};
