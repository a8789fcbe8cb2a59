//! `citpass rm` — delete an entry and its index row.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{is_interactive, open_store, pick_title, prompt_passphrase, Cli};
use crate::errors::{CitpassError, Result};

/// Execute the `rm` command.
pub fn execute(cli: &Cli, title: &str, force: bool) -> Result<()> {
    let store = open_store(cli)?;
    if !store.is_initialized() {
        return Err(CitpassError::NotInitialized(store.config().root.clone()));
    }

    let password = prompt_passphrase()?;

    // Resolve the title first so a typo can be corrected interactively.
    let title = match store.index().lookup(password.as_bytes(), title) {
        Ok(_) => title.to_string(),
        Err(CitpassError::EntryNotFound(missing)) if is_interactive() => {
            pick_title(&store, password.as_bytes(), &missing)?
        }
        Err(e) => return Err(e),
    };

    // Unless --force is set, ask for confirmation on a terminal.
    if !force && is_interactive() {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete entry '{title}'?"))
            .default(false)
            .interact()
            .map_err(|e| CitpassError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    store.remove(password.as_bytes(), &title)?;
    output::success(&format!("Deleted entry '{title}'"));

    Ok(())
}
