//! Random file names for password entries.
//!
//! Identifiers only have to avoid accidental collisions, they are not
//! secret, so the generator is a plain PRNG seeded from the wall clock.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Default identifier length.
pub const DEFAULT_IDENTIFIER_LEN: usize = 50;

const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Produces identifiers drawn uniformly from `[A-Za-z0-9]`.
///
/// Not suitable for key material.
pub struct IdentifierGenerator {
    rng: StdRng,
}

impl IdentifierGenerator {
    /// Seed from the current time (and the process id, so two
    /// invocations in the same instant still diverge).
    pub fn from_clock() -> Self {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
        let pid = u64::from(std::process::id());
        Self::with_seed(nanos ^ pid.rotate_left(32))
    }

    /// Deterministic generator, for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Produce one identifier of `len` characters.
    pub fn produce(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| char::from(ALPHABET[self.rng.random_range(0..ALPHABET.len())]))
            .collect()
    }
}

/// `true` if `name` could have come from an `IdentifierGenerator`.
///
/// Used to refuse path-like identifiers and to pick entry files out of
/// a directory listing.
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric())
}
