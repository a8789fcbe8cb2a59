//! The sealed index mapping entry titles to entry identifiers.
//!
//! Decrypted, the index is plain text:
//!
//! ```text
//! Filename,Title
//! <identifier>,<title>
//! <identifier>,<title>
//! ```
//!
//! Rows are separated by `\n`; the first comma on a row splits the
//! identifier from the title.  Titles may contain commas but not line
//! breaks.  The header row is always kept on disk and never returned as
//! an entry.

use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, info};

use super::format::{self, SealedBlob, WriteMode};
use super::identifier::IdentifierGenerator;
use crate::config::StoreConfig;
use crate::crypto::kdf::Argon2Params;
use crate::errors::{CitpassError, Result};

/// The fixed first row of every index.
pub const HEADER_ROW: &str = "Filename,Title";

/// One `identifier,title` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    pub identifier: String,
    pub title: String,
}

/// Split decrypted index text into rows, header included.
///
/// Pure tokenizer: no I/O and no header check.  A single trailing `\n`
/// is tolerated; empty rows elsewhere and rows without a comma are errors.
pub fn rows(bytes: &[u8]) -> Result<Vec<IndexRow>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| CitpassError::InvalidIndex("index is not valid UTF-8".into()))?;
    let text = text.strip_suffix('\n').unwrap_or(text);

    text.split('\n')
        .enumerate()
        .map(|(n, line)| {
            let (identifier, title) = line.split_once(',').ok_or_else(|| {
                CitpassError::InvalidIndex(format!("row {} has no ',' separator", n + 1))
            })?;
            Ok(IndexRow {
                identifier: identifier.to_string(),
                title: title.to_string(),
            })
        })
        .collect()
}

/// Reject titles the row grammar cannot carry.
pub fn validate_title(title: &str) -> Result<()> {
    if title.is_empty() {
        return Err(CitpassError::InvalidTitle("title cannot be empty".into()));
    }
    if title.contains(['\n', '\r']) {
        return Err(CitpassError::InvalidTitle(
            "title cannot contain line breaks".into(),
        ));
    }
    Ok(())
}

/// The decrypted index, header excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    entries: Vec<IndexRow>,
}

impl Index {
    /// An index holding only the header row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse decrypted index text; the first row must be the header.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut all = rows(bytes)?.into_iter();

        match all.next() {
            Some(row) if row.identifier == "Filename" && row.title == "Title" => {}
            _ => {
                return Err(CitpassError::InvalidIndex(format!(
                    "first row is not '{HEADER_ROW}'"
                )))
            }
        }

        Ok(Self {
            entries: all.collect(),
        })
    }

    /// Serialize back to text, header first.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut text = String::from(HEADER_ROW);
        for row in &self.entries {
            text.push('\n');
            text.push_str(&row.identifier);
            text.push(',');
            text.push_str(&row.title);
        }
        text.into_bytes()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[IndexRow] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First row titled exactly `title` (case-sensitive).
    pub fn find(&self, title: &str) -> Option<&IndexRow> {
        self.entries.iter().find(|row| row.title == title)
    }

    pub fn contains_identifier(&self, identifier: &str) -> bool {
        self.entries.iter().any(|row| row.identifier == identifier)
    }

    /// Append a row, refusing bad or duplicate titles.
    pub fn push(&mut self, identifier: &str, title: &str) -> Result<()> {
        validate_title(title)?;
        if self.find(title).is_some() {
            return Err(CitpassError::DuplicateTitle(title.to_string()));
        }
        if self.contains_identifier(identifier) {
            return Err(CitpassError::IdentifierCollision(identifier.to_string()));
        }

        self.entries.push(IndexRow {
            identifier: identifier.to_string(),
            title: title.to_string(),
        });
        Ok(())
    }

    /// Remove the first row titled `title` and return it.
    pub fn remove(&mut self, title: &str) -> Result<IndexRow> {
        let pos = self
            .entries
            .iter()
            .position(|row| row.title == title)
            .ok_or_else(|| CitpassError::EntryNotFound(title.to_string()))?;
        Ok(self.entries.remove(pos))
    }
}

/// Outcome of `IndexStore::initialize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Created,
    AlreadyExists,
}

/// Reads and writes the sealed index file.
pub struct IndexStore {
    path: PathBuf,
    params: Argon2Params,
    max_bytes: u64,
    identifier_len: usize,
}

impl IndexStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            path: config.index_path(),
            params: config.argon2,
            max_bytes: config.max_blob_bytes,
            identifier_len: config.identifier_len,
        }
    }

    /// Path of the index file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Create an index holding only the header, unless one already exists.
    pub fn initialize(&self, passphrase: &[u8]) -> Result<InitOutcome> {
        if self.path.exists() {
            debug!(path = %self.path.display(), "index already present");
            return Ok(InitOutcome::AlreadyExists);
        }

        self.save(passphrase, &Index::new())?;
        info!(path = %self.path.display(), "created index");
        Ok(InitOutcome::Created)
    }

    /// Decrypt and parse the index.
    ///
    /// Oversized files are rejected before anything is read into memory.
    pub fn load(&self, passphrase: &[u8]) -> Result<Index> {
        let blob = format::read_sealed(&self.path, self.max_bytes).map_err(|e| match e {
            CitpassError::Io(io) if io.kind() == ErrorKind::NotFound => {
                let root = self.path.parent().unwrap_or(&self.path).to_path_buf();
                CitpassError::NotInitialized(root)
            }
            other => other,
        })?;
        let plaintext = blob.open(passphrase)?;
        let index = Index::parse(&plaintext)?;
        debug!(entries = index.len(), "opened index");
        Ok(index)
    }

    /// Seal `index` under a freshly derived key and replace the file.
    ///
    /// An index that would be too large to load again is refused and the
    /// file on disk is left as it was.
    pub fn save(&self, passphrase: &[u8], index: &Index) -> Result<()> {
        let plaintext = index.to_bytes();
        format::check_plaintext_len(&self.path, plaintext.len(), self.max_bytes)?;
        let blob = SealedBlob::seal(passphrase, &self.params, &plaintext)?;
        format::write_sealed(&self.path, &blob, WriteMode::Replace)
    }

    /// Generate a fresh identifier, append `identifier,title`, reseal.
    ///
    /// Load, mutate and save are separate steps; a crash in between
    /// leaves the previous index intact.
    pub fn append(
        &self,
        passphrase: &[u8],
        title: &str,
        ids: &mut IdentifierGenerator,
    ) -> Result<String> {
        let mut index = self.load(passphrase)?;
        let identifier = ids.produce(self.identifier_len);
        index.push(&identifier, title)?;
        self.save(passphrase, &index)?;
        info!(%identifier, "appended index row");
        Ok(identifier)
    }

    /// Every entry row in insertion order, header excluded.
    pub fn list(&self, passphrase: &[u8]) -> Result<Vec<IndexRow>> {
        Ok(self.load(passphrase)?.entries)
    }

    /// Identifier of the entry titled `title`.
    pub fn lookup(&self, passphrase: &[u8], title: &str) -> Result<String> {
        let index = self.load(passphrase)?;
        index
            .find(title)
            .map(|row| row.identifier.clone())
            .ok_or_else(|| CitpassError::EntryNotFound(title.to_string()))
    }

    /// Drop the row titled `title`, reseal, and return the freed identifier.
    pub fn remove(&self, passphrase: &[u8], title: &str) -> Result<String> {
        let mut index = self.load(passphrase)?;
        let row = index.remove(title)?;
        self.save(passphrase, &index)?;
        info!(identifier = %row.identifier, "removed index row");
        Ok(row.identifier)
    }
}
