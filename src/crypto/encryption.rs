//! AES-256-GCM authenticated encryption.
//!
//! AES-GCM is a counter-mode stream cipher paired with a GHASH MAC, so the
//! ciphertext is exactly as long as the plaintext plus a 16-byte tag.  The
//! nonce is supplied by the caller because it is stored next to the
//! ciphertext in the sealed file rather than prepended here.
//!
//! Layout of the returned byte buffer:
//!   [ ciphertext (plaintext length) | 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use zeroize::Zeroizing;

use super::keys::MasterKey;
use crate::errors::{CitpassError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Generate a random 12-byte nonce.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce);
    nonce
}

/// Encrypt and authenticate `plaintext`, also authenticating `aad`.
///
/// The result is always `plaintext.len() + TAG_LEN` bytes.
pub fn seal(
    key: &MasterKey,
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CitpassError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| CitpassError::EncryptionFailed(format!("encryption error: {e}")))?;

    debug_assert_eq!(ciphertext.len(), plaintext.len() + TAG_LEN);
    Ok(ciphertext)
}

/// Verify and decrypt data produced by `seal`.
///
/// Fails closed: on any tag mismatch nothing is returned.
pub fn open(
    key: &MasterKey,
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    if ciphertext.len() < TAG_LEN {
        return Err(CitpassError::AuthenticationFailed);
    }

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CitpassError::AuthenticationFailed)?;

    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CitpassError::AuthenticationFailed)?;

    Ok(Zeroizing::new(plaintext))
}
