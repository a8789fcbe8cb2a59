//! High-level store operations used by CLI commands.
//!
//! `PasswordStore` ties the index and the entry files together so the
//! pair stays consistent: every index row has one entry file and every
//! entry file has one row.

use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::errors::{CitpassError, Result};

use super::entry::{EntryStore, PasswordEntry};
use super::identifier::IdentifierGenerator;
use super::index::{IndexRow, IndexStore, InitOutcome};

/// What `init` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitReport {
    /// The store directory was created by this call.
    pub created_root: bool,
    /// Whether a new index was written or one was already there.
    pub index: InitOutcome,
}

/// Mismatches between the index and the files on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// Index rows whose entry file is missing.
    pub dangling: Vec<IndexRow>,
    /// Entry files no index row refers to.
    pub orphans: Vec<String>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.dangling.is_empty() && self.orphans.is_empty()
    }
}

/// The store handle.  Every method takes the master passphrase; keys are
/// derived per seal/open and never kept.
pub struct PasswordStore {
    config: StoreConfig,
    index: IndexStore,
    entries: EntryStore,
}

impl PasswordStore {
    pub fn new(config: StoreConfig) -> Self {
        let index = IndexStore::new(&config);
        let entries = EntryStore::new(&config);
        Self {
            config,
            index,
            entries,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn index(&self) -> &IndexStore {
        &self.index
    }

    pub fn entries(&self) -> &EntryStore {
        &self.entries
    }

    /// `true` once `init` has written an index.
    pub fn is_initialized(&self) -> bool {
        self.index.exists()
    }

    fn require_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(CitpassError::NotInitialized(self.config.root.clone()))
        }
    }

    /// Create the store directory and a header-only index as needed.
    pub fn init(&self, passphrase: &[u8]) -> Result<InitReport> {
        let created_root = self.config.ensure_root()?;
        let index = self.index.initialize(passphrase)?;
        Ok(InitReport {
            created_root,
            index,
        })
    }

    /// Store `entry` and index it under its title.  Returns the new
    /// entry's identifier.
    ///
    /// The entry file is written before the index row; if resealing the
    /// index fails the entry file is removed again.
    pub fn add(
        &self,
        passphrase: &[u8],
        entry: &PasswordEntry,
        ids: &mut IdentifierGenerator,
    ) -> Result<String> {
        self.require_initialized()?;
        entry.validate()?;

        let mut index = self.index.load(passphrase)?;
        if index.find(&entry.title).is_some() {
            return Err(CitpassError::DuplicateTitle(entry.title.clone()));
        }

        let identifier = ids.produce(self.config.identifier_len);
        if index.contains_identifier(&identifier) || self.entries.exists(&identifier) {
            return Err(CitpassError::IdentifierCollision(identifier));
        }

        self.entries.create(passphrase, &identifier, entry)?;

        let indexed = index
            .push(&identifier, &entry.title)
            .and_then(|()| self.index.save(passphrase, &index));
        if let Err(e) = indexed {
            warn!(%identifier, "index update failed, removing new entry file");
            if let Err(cleanup) = self.entries.delete(&identifier) {
                warn!(%identifier, error = %cleanup, "could not remove orphaned entry file");
            }
            return Err(e);
        }

        info!(%identifier, "added entry");
        Ok(identifier)
    }

    /// Every entry row, in insertion order.
    pub fn list(&self, passphrase: &[u8]) -> Result<Vec<IndexRow>> {
        self.require_initialized()?;
        self.index.list(passphrase)
    }

    /// Just the titles, in insertion order.
    pub fn titles(&self, passphrase: &[u8]) -> Result<Vec<String>> {
        Ok(self
            .list(passphrase)?
            .into_iter()
            .map(|row| row.title)
            .collect())
    }

    /// Decrypt the entry titled `title`.
    pub fn get(&self, passphrase: &[u8], title: &str) -> Result<PasswordEntry> {
        self.require_initialized()?;
        let identifier = self.index.lookup(passphrase, title)?;
        self.entries.read(passphrase, &identifier)
    }

    /// Drop `title` from the index, then delete its entry file.
    ///
    /// A missing entry file is logged and otherwise ignored.
    pub fn remove(&self, passphrase: &[u8], title: &str) -> Result<String> {
        self.require_initialized()?;
        let identifier = self.index.remove(passphrase, title)?;

        match self.entries.delete(&identifier) {
            Ok(()) => {}
            Err(CitpassError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(%identifier, "entry file was already gone");
            }
            Err(e) => return Err(e),
        }

        Ok(identifier)
    }

    /// Compare index rows against the entry files on disk.
    pub fn check(&self, passphrase: &[u8]) -> Result<ConsistencyReport> {
        self.require_initialized()?;
        let rows = self.index.list(passphrase)?;
        let files = self.entries.identifiers()?;

        let dangling = rows
            .iter()
            .filter(|row| !files.contains(&row.identifier))
            .cloned()
            .collect();
        let orphans = files
            .into_iter()
            .filter(|file| !rows.iter().any(|row| &row.identifier == file))
            .collect();

        Ok(ConsistencyReport { dangling, orphans })
    }
}
