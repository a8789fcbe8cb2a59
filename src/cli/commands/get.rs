//! `citpass get` — decrypt an entry and print or copy its password.

use crate::cli::output;
use crate::cli::{is_interactive, open_store, pick_title, prompt_passphrase, Cli};
use crate::errors::{CitpassError, Result};

/// Execute the `get` command.
pub fn execute(cli: &Cli, title: &str, all: bool, clip: bool) -> Result<()> {
    let store = open_store(cli)?;
    if !store.is_initialized() {
        return Err(CitpassError::NotInitialized(store.config().root.clone()));
    }

    let password = prompt_passphrase()?;

    let entry = match store.get(password.as_bytes(), title) {
        Err(CitpassError::EntryNotFound(missing)) if is_interactive() => {
            let chosen = pick_title(&store, password.as_bytes(), &missing)?;
            store.get(password.as_bytes(), &chosen)?
        }
        other => other?,
    };

    if clip {
        copy_to_clipboard(&entry.password)?;
        output::success(&format!("Password for '{}' copied to clipboard", entry.title));
    }

    if all {
        output::print_entry(&entry, !clip);
    } else if !clip {
        // Bare password on stdout so it can be piped.
        println!("{}", entry.password);
    }

    Ok(())
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| CitpassError::CommandFailed(format!("clipboard unavailable: {e}")))?;
    clipboard
        .set_text(text.to_owned())
        .map_err(|e| CitpassError::CommandFailed(format!("clipboard write failed: {e}")))
}
