//! Vault module — the encrypted password store.
//!
//! This module provides:
//! - The sealed file format shared by index and entries (`format`)
//! - Random entry file names (`identifier`)
//! - The title → identifier index (`index`)
//! - Per-credential entry files (`entry`)
//! - The `PasswordStore` facade used by CLI commands (`store`)

pub mod entry;
pub mod format;
pub mod identifier;
pub mod index;
pub mod store;

// Re-export the most commonly used items.
pub use entry::{EntryStore, PasswordEntry};
pub use format::SealedBlob;
pub use identifier::{IdentifierGenerator, DEFAULT_IDENTIFIER_LEN};
pub use index::{rows, Index, IndexRow, IndexStore, InitOutcome, HEADER_ROW};
pub use store::{ConsistencyReport, InitReport, PasswordStore};
