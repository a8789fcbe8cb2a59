//! `citpass add` — prompt for a new entry and store it.

use crate::cli::output;
use crate::cli::{open_store, prompt_entry, prompt_passphrase, Cli};
use crate::errors::{CitpassError, Result};
use crate::vault::IdentifierGenerator;

/// Execute the `add` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    if !store.is_initialized() {
        return Err(CitpassError::NotInitialized(store.config().root.clone()));
    }

    // Entry fields first, then the master password that seals them.
    let entry = prompt_entry()?;
    let password = prompt_passphrase()?;

    let mut ids = IdentifierGenerator::from_clock();
    store.add(password.as_bytes(), &entry, &mut ids)?;

    output::success(&format!("Added '{}'", entry.title));
    Ok(())
}
