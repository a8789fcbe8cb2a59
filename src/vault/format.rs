//! Sealed file format shared by the index and every entry.
//!
//! A sealed file has this layout:
//!
//! ```text
//! [CTPS: 4][version: 1][m_cost: 4 LE][t_cost: 4 LE][p_cost: 4 LE][salt: 32][nonce: 12][ciphertext][tag: 16]
//! ```
//!
//! - **Magic** (`CTPS`) and **version** identify the file.
//! - **m/t/p cost**: the Argon2id parameters the key was derived with.
//! - **Salt**: random, fresh for every seal, so the key can be
//!   re-derived at open time.
//! - **Nonce**: random, fresh for every seal.
//! - **Ciphertext + tag**: AES-256-GCM output; the 61-byte header is
//!   authenticated as associated data.
//!
//! The ciphertext is exactly as long as the plaintext, so the plaintext
//! length is known from the file size alone.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::encryption::{self, NONCE_LEN, TAG_LEN};
use crate::crypto::kdf::{self, Argon2Params, SALT_LEN};
use crate::errors::{CitpassError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes at the start of every sealed file.
const MAGIC: &[u8; 4] = b"CTPS";

/// Current format version.
pub const CURRENT_VERSION: u8 = 1;

/// Fixed-size header: magic + version + three u32 costs + salt + nonce.
pub const HEADER_LEN: usize = 4 + 1 + 12 + SALT_LEN + NONCE_LEN;

/// Smallest possible sealed file (empty plaintext).
pub const MIN_SEALED_LEN: usize = HEADER_LEN + TAG_LEN;

// ---------------------------------------------------------------------------
// SealedBlob
// ---------------------------------------------------------------------------

/// One unit of authenticated-encrypted storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBlob {
    params: Argon2Params,
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    /// Ciphertext followed by the tag.
    ciphertext: Vec<u8>,
}

impl SealedBlob {
    /// Seal `plaintext` under a key derived from `passphrase` and a fresh salt.
    pub fn seal(passphrase: &[u8], params: &Argon2Params, plaintext: &[u8]) -> Result<Self> {
        let salt = kdf::generate_salt();
        let nonce = encryption::generate_nonce();
        let key = kdf::derive_master_key(passphrase, &salt, params)?;

        let header = encode_header(params, &salt, &nonce);
        let ciphertext = encryption::seal(&key, &nonce, plaintext, &header)?;

        Ok(Self {
            params: *params,
            salt,
            nonce,
            ciphertext,
        })
    }

    /// Re-derive the key from `passphrase` and the stored salt, then
    /// verify and decrypt.
    pub fn open(&self, passphrase: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let key = kdf::derive_master_key(passphrase, &self.salt, &self.params)?;
        let header = self.header();
        encryption::open(&key, &self.nonce, &self.ciphertext, &header)
    }

    /// Number of plaintext bytes this blob decrypts to.
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len() - TAG_LEN
    }

    /// KDF parameters the blob was sealed with.
    pub fn params(&self) -> &Argon2Params {
        &self.params
    }

    fn header(&self) -> [u8; HEADER_LEN] {
        encode_header(&self.params, &self.salt, &self.nonce)
    }

    /// Serialize to the on-disk byte layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.ciphertext.len());
        buf.extend_from_slice(&self.header());
        buf.extend_from_slice(&self.ciphertext);
        buf
    }

    /// Parse the on-disk byte layout.  Nothing is decrypted here.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < MIN_SEALED_LEN {
            return Err(CitpassError::InvalidBlobFormat(format!(
                "{} bytes is too small to be a sealed file",
                data.len()
            )));
        }

        if &data[0..4] != MAGIC {
            return Err(CitpassError::InvalidBlobFormat(
                "missing CTPS magic bytes".into(),
            ));
        }

        let version = data[4];
        if version != CURRENT_VERSION {
            return Err(CitpassError::InvalidBlobFormat(format!(
                "unsupported version {version}, expected {CURRENT_VERSION}"
            )));
        }

        let params = Argon2Params {
            memory_kib: read_u32(data, 5)?,
            iterations: read_u32(data, 9)?,
            parallelism: read_u32(data, 13)?,
        };
        params
            .validate()
            .map_err(|e| CitpassError::InvalidBlobFormat(format!("stored KDF cost: {e}")))?;

        let salt_start = 17;
        let nonce_start = salt_start + SALT_LEN;
        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&data[salt_start..nonce_start]);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&data[nonce_start..HEADER_LEN]);

        Ok(Self {
            params,
            salt,
            nonce,
            ciphertext: data[HEADER_LEN..].to_vec(),
        })
    }
}

fn encode_header(
    params: &Argon2Params,
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[0..4].copy_from_slice(MAGIC);
    header[4] = CURRENT_VERSION;
    header[5..9].copy_from_slice(&params.memory_kib.to_le_bytes());
    header[9..13].copy_from_slice(&params.iterations.to_le_bytes());
    header[13..17].copy_from_slice(&params.parallelism.to_le_bytes());
    header[17..17 + SALT_LEN].copy_from_slice(salt);
    header[17 + SALT_LEN..HEADER_LEN].copy_from_slice(nonce);
    header
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    let bytes: [u8; 4] = data[offset..offset + 4]
        .try_into()
        .map_err(|_| CitpassError::InvalidBlobFormat("truncated header".into()))?;
    Ok(u32::from_le_bytes(bytes))
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// How `write_sealed` treats an existing file at the target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Atomically replace whatever is there.
    Replace,
    /// Fail with `AlreadyExists` if the target exists.
    CreateNew,
}

/// Refuse a sealed payload (ciphertext plus tag) above `limit` bytes.
/// The fixed header does not count towards the limit.
pub fn check_payload_len(path: &Path, payload_len: u64, limit: u64) -> Result<()> {
    if payload_len > limit {
        return Err(CitpassError::SizeLimitExceeded {
            path: path.to_path_buf(),
            size: payload_len,
            limit,
        });
    }
    Ok(())
}

/// Refuse to seal `plaintext_len` bytes for `path` if the result could
/// not be read back under `limit`.
pub fn check_plaintext_len(path: &Path, plaintext_len: usize, limit: u64) -> Result<()> {
    let payload_len = u64::try_from(plaintext_len)
        .unwrap_or(u64::MAX)
        .saturating_add(TAG_LEN as u64);
    check_payload_len(path, payload_len, limit)
}

/// Read a sealed file whose payload may be at most `limit` bytes.
///
/// The size is checked from metadata before any buffer is allocated, and
/// the buffer is reserved fallibly.
pub fn read_sealed(path: &Path, limit: u64) -> Result<SealedBlob> {
    let file = File::open(path)?;
    let metadata = file.metadata()?;

    if !metadata.is_file() {
        return Err(CitpassError::InvalidBlobFormat(format!(
            "{} is not a regular file",
            path.display()
        )));
    }

    let size = metadata.len();
    check_payload_len(path, size.saturating_sub(HEADER_LEN as u64), limit)?;

    let len = usize::try_from(size).map_err(|_| {
        CitpassError::AllocationFailed(format!("{size} bytes exceeds the address space"))
    })?;
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|e| CitpassError::AllocationFailed(format!("reading {}: {e}", path.display())))?;
    file.take(size).read_to_end(&mut data)?;

    debug!(path = %path.display(), bytes = data.len(), "read sealed file");
    SealedBlob::from_bytes(&data)
}

/// Write a sealed file so readers never observe it half-written.
///
/// The bytes go to `.<name>.tmp` in the same directory (mode 0600) and
/// are synced, then moved into place: by `rename` for `Replace`, by
/// `hard_link` for `CreateNew` so an existing target is never clobbered.
pub fn write_sealed(path: &Path, blob: &SealedBlob, mode: WriteMode) -> Result<()> {
    let tmp_path = temp_path_for(path);
    let bytes = blob.to_bytes();

    let mut file = create_private_file(&tmp_path)?;
    let written = file.write_all(&bytes).and_then(|()| file.sync_all());
    drop(file);
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    let placed = match mode {
        WriteMode::Replace => fs::rename(&tmp_path, path),
        WriteMode::CreateNew => {
            let linked = fs::hard_link(&tmp_path, path);
            let _ = fs::remove_file(&tmp_path);
            linked
        }
    };
    if let Err(e) = placed {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    debug!(path = %path.display(), bytes = bytes.len(), ?mode, "wrote sealed file");
    Ok(())
}

/// `.<name>.tmp` next to `path`.
fn temp_path_for(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ))
}

/// Create `path` fresh with mode 0600.  A stale file left by an earlier
/// crash is removed first so its permissions are not inherited.
fn create_private_file(path: &Path) -> std::io::Result<File> {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed stale temp file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)
}
