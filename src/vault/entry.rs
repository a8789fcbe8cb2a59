//! Password entries, one sealed file each, named by identifier.
//!
//! Decrypted, an entry is five labelled lines in fixed order:
//!
//! ```text
//! Title: <title>
//! Password: <password>
//! Username: <username>
//! URL: <url>
//! Notes: <notes>
//! ```
//!
//! Only the notes may span several lines; they run to the end of the text.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::format::{self, SealedBlob, WriteMode};
use super::identifier::is_identifier;
use super::index::validate_title;
use crate::config::{StoreConfig, INDEX_FILE_NAME};
use crate::crypto::kdf::Argon2Params;
use crate::errors::{CitpassError, Result};

const SINGLE_LINE_LABELS: [&str; 4] = ["Title", "Password", "Username", "URL"];
const NOTES_LABEL: &str = "Notes";

/// The free-text fields of one credential.
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PasswordEntry {
    pub title: String,
    pub password: String,
    pub username: String,
    pub url: String,
    pub notes: String,
}

impl std::fmt::Debug for PasswordEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordEntry")
            .field("title", &self.title)
            .field("password", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl PasswordEntry {
    /// Check that every field fits the line-based layout.
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        for (label, value) in [
            ("Password", &self.password),
            ("Username", &self.username),
            ("URL", &self.url),
        ] {
            if value.contains(['\n', '\r']) {
                return Err(CitpassError::InvalidEntry(format!(
                    "{label} cannot contain line breaks"
                )));
            }
        }
        Ok(())
    }

    /// Render the labelled plaintext.
    pub fn to_plaintext(&self) -> Zeroizing<String> {
        Zeroizing::new(format!(
            "Title: {}\nPassword: {}\nUsername: {}\nURL: {}\nNotes: {}",
            self.title, self.password, self.username, self.url, self.notes
        ))
    }

    /// Parse the labelled plaintext produced by `to_plaintext`.
    pub fn from_plaintext(text: &str) -> Result<Self> {
        let mut rest = text;
        let mut values: Vec<&str> = Vec::with_capacity(SINGLE_LINE_LABELS.len());

        for label in SINGLE_LINE_LABELS {
            let (line, tail) = rest.split_once('\n').ok_or_else(|| {
                CitpassError::InvalidEntry(format!("missing line after '{label}'"))
            })?;
            values.push(strip_label(line, label)?);
            rest = tail;
        }
        let notes = strip_label(rest, NOTES_LABEL)?;

        Ok(Self {
            title: values[0].to_string(),
            password: values[1].to_string(),
            username: values[2].to_string(),
            url: values[3].to_string(),
            notes: notes.to_string(),
        })
    }
}

fn strip_label<'a>(line: &'a str, label: &str) -> Result<&'a str> {
    line.strip_prefix(label)
        .and_then(|s| s.strip_prefix(": "))
        .ok_or_else(|| CitpassError::InvalidEntry(format!("expected '{label}: ' field")))
}

/// Reads, writes and deletes entry files under the store root.
pub struct EntryStore {
    root: PathBuf,
    params: Argon2Params,
    max_bytes: u64,
}

impl EntryStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            root: config.root.clone(),
            params: config.argon2,
            max_bytes: config.max_blob_bytes,
        }
    }

    fn path_for(&self, identifier: &str) -> Result<PathBuf> {
        if !is_identifier(identifier) || identifier == INDEX_FILE_NAME {
            return Err(CitpassError::InvalidEntry(format!(
                "'{identifier}' is not a valid entry identifier"
            )));
        }
        Ok(self.root.join(identifier))
    }

    pub fn exists(&self, identifier: &str) -> bool {
        self.path_for(identifier)
            .map(|p| p.exists())
            .unwrap_or(false)
    }

    /// Seal `entry` under a freshly derived key into `<root>/<identifier>`.
    ///
    /// An existing file with that name is never overwritten; that case
    /// is an `IdentifierCollision`.  Entries too large to read back are
    /// refused with `SizeLimitExceeded` before anything is written.
    pub fn create(&self, passphrase: &[u8], identifier: &str, entry: &PasswordEntry) -> Result<()> {
        entry.validate()?;
        let path = self.path_for(identifier)?;

        let plaintext = entry.to_plaintext();
        format::check_plaintext_len(&path, plaintext.len(), self.max_bytes)?;
        let blob = SealedBlob::seal(passphrase, &self.params, plaintext.as_bytes())?;

        format::write_sealed(&path, &blob, WriteMode::CreateNew).map_err(|e| match e {
            CitpassError::Io(io) if io.kind() == ErrorKind::AlreadyExists => {
                CitpassError::IdentifierCollision(identifier.to_string())
            }
            other => other,
        })?;
        info!(%identifier, "created entry file");
        Ok(())
    }

    /// Open `<root>/<identifier>` and parse its fields.
    pub fn read(&self, passphrase: &[u8], identifier: &str) -> Result<PasswordEntry> {
        let path = self.path_for(identifier)?;
        let blob = format::read_sealed(&path, self.max_bytes)?;
        debug!(%identifier, plaintext_len = blob.plaintext_len(), "opening entry");

        let plaintext = blob.open(passphrase)?;
        let text = std::str::from_utf8(&plaintext)
            .map_err(|_| CitpassError::InvalidEntry("entry is not valid UTF-8".into()))?;
        PasswordEntry::from_plaintext(text)
    }

    /// Unlink the entry file.
    ///
    /// This is an ordinary delete: the old ciphertext may survive on the
    /// underlying medium.
    pub fn delete(&self, identifier: &str) -> Result<()> {
        let path = self.path_for(identifier)?;
        fs::remove_file(&path)?;
        info!(%identifier, "deleted entry file");
        Ok(())
    }

    /// Names of every identifier-shaped file under the root.
    pub fn identifiers(&self) -> Result<Vec<String>> {
        let mut found = Vec::new();
        for dirent in fs::read_dir(&self.root)? {
            let dirent = dirent?;
            if !dirent.file_type()?.is_file() {
                continue;
            }
            let name = dirent.file_name();
            let Some(name) = name.to_str() else { continue };
            if name != INDEX_FILE_NAME && is_identifier(name) {
                found.push(name.to_string());
            }
        }
        found.sort();
        Ok(found)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
