//! `citpass init` — create the store directory and an empty index.

use crate::cli::output;
use crate::cli::{open_store, prompt_new_passphrase, Cli};
use crate::errors::Result;
use crate::vault::InitOutcome;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let root = store.config().root.clone();
    let index_path = store.index().path().to_path_buf();

    // 1. Nothing to do if the index is already there.
    if store.is_initialized() {
        output::info(&format!(
            "The index file at {} exists. No action necessary.",
            index_path.display()
        ));
        return Ok(());
    }

    // 2. Prompt for a new master password (with confirmation).
    let password = prompt_new_passphrase()?;

    // 3. Create the directory (0700) and the header-only index.
    let report = store.init(password.as_bytes())?;
    if report.created_root {
        output::info(&format!("Created store directory: {}", root.display()));
    }

    match report.index {
        InitOutcome::Created => {
            output::success(&format!("Created index at {}", index_path.display()));
            output::tip("Run `citpass add` to add a password.");
            output::tip("Run `citpass ls` to list entries.");
        }
        InitOutcome::AlreadyExists => {
            output::info(&format!(
                "The index file at {} exists. No action necessary.",
                index_path.display()
            ));
        }
    }

    Ok(())
}
