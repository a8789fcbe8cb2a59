//! Password-based key derivation using Argon2id.
//!
//! Argon2id is a memory-hard KDF that protects against brute-force and
//! GPU-based attacks.  Every sealed file records the parameters it was
//! derived with, so `Argon2Params` is both the configured cost for new
//! seals and the stored cost read back from disk.

use argon2::{Algorithm, Argon2, Block, Params, Version};
use rand::RngCore;

use super::keys::{MasterKey, KEY_LEN};
use crate::errors::{CitpassError, Result};

/// Length of the salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Minimum memory cost in KiB (8 MB).
pub const MIN_MEMORY_KIB: u32 = 8_192;

/// Maximum memory cost in KiB (1 GB).
pub const MAX_MEMORY_KIB: u32 = 1_048_576;

/// Maximum number of passes over memory.
pub const MAX_ITERATIONS: u32 = 64;

/// Maximum number of lanes.
pub const MAX_PARALLELISM: u32 = 16;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 262 144 = 256 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 1).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    /// The "moderate" cost: 256 MB, 3 passes, 1 lane.
    fn default() -> Self {
        Self {
            memory_kib: 262_144,
            iterations: 3,
            parallelism: 1,
        }
    }
}

impl Argon2Params {
    /// Check the parameters against the accepted bounds.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_MEMORY_KIB..=MAX_MEMORY_KIB).contains(&self.memory_kib) {
            return Err(CitpassError::KeyDerivationFailed(format!(
                "Argon2 memory_kib must be within {MIN_MEMORY_KIB}..={MAX_MEMORY_KIB} (got {})",
                self.memory_kib
            )));
        }
        if !(1..=MAX_ITERATIONS).contains(&self.iterations) {
            return Err(CitpassError::KeyDerivationFailed(format!(
                "Argon2 iterations must be within 1..={MAX_ITERATIONS} (got {})",
                self.iterations
            )));
        }
        if !(1..=MAX_PARALLELISM).contains(&self.parallelism) {
            return Err(CitpassError::KeyDerivationFailed(format!(
                "Argon2 parallelism must be within 1..={MAX_PARALLELISM} (got {})",
                self.parallelism
            )));
        }
        Ok(())
    }
}

/// Derive a 32-byte master key from a passphrase and salt using Argon2id.
///
/// The same passphrase + salt + params always produce the same key.
/// The working memory is reserved up front; if the host cannot provide it
/// the derivation fails with `KeyDerivationFailed` instead of aborting.
pub fn derive_master_key(
    passphrase: &[u8],
    salt: &[u8],
    argon2_params: &Argon2Params,
) -> Result<MasterKey> {
    argon2_params.validate()?;

    let params = Params::new(
        argon2_params.memory_kib,
        argon2_params.iterations,
        argon2_params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| CitpassError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))?;

    let block_count = params.block_count();
    let mut blocks: Vec<Block> = Vec::new();
    blocks.try_reserve_exact(block_count).map_err(|_| {
        CitpassError::KeyDerivationFailed(format!(
            "cannot allocate {} KiB of Argon2 working memory",
            argon2_params.memory_kib
        ))
    })?;
    blocks.resize(block_count, Block::default());

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into_with_memory(passphrase, salt, &mut key, &mut blocks)
        .map_err(|e| CitpassError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;

    Ok(MasterKey::new(key))
}

/// Generate a cryptographically random 32-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2Params {
        Argon2Params {
            memory_kib: MIN_MEMORY_KIB,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn default_params_are_moderate() {
        let p = Argon2Params::default();
        assert_eq!(p.memory_kib, 262_144);
        assert_eq!(p.iterations, 3);
        assert_eq!(p.parallelism, 1);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_params() {
        let low_memory = Argon2Params {
            memory_kib: 1_024,
            ..cheap()
        };
        assert!(matches!(
            low_memory.validate(),
            Err(CitpassError::KeyDerivationFailed(_))
        ));

        let zero_iterations = Argon2Params {
            iterations: 0,
            ..cheap()
        };
        assert!(zero_iterations.validate().is_err());

        let many_lanes = Argon2Params {
            parallelism: 64,
            ..cheap()
        };
        assert!(many_lanes.validate().is_err());
    }

    #[test]
    fn derivation_is_deterministic() {
        let salt = [7u8; SALT_LEN];
        let a = derive_master_key(b"hunter2", &salt, &cheap()).unwrap();
        let b = derive_master_key(b"hunter2", &salt, &cheap()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn salts_are_random() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
