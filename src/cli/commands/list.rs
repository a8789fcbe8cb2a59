//! `citpass ls` — print every entry title.

use crate::cli::output;
use crate::cli::{open_store, prompt_passphrase, Cli};
use crate::errors::{CitpassError, Result};

/// Execute the `ls` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    if !store.is_initialized() {
        return Err(CitpassError::NotInitialized(store.config().root.clone()));
    }

    let password = prompt_passphrase()?;
    let rows = store.list(password.as_bytes())?;

    output::print_titles(&rows);
    Ok(())
}
