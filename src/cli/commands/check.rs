//! `citpass check` — report index rows and entry files that do not match.

use crate::cli::output;
use crate::cli::{open_store, prompt_passphrase, Cli};
use crate::errors::{CitpassError, Result};

/// Execute the `check` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    if !store.is_initialized() {
        return Err(CitpassError::NotInitialized(store.config().root.clone()));
    }

    let password = prompt_passphrase()?;
    let report = store.check(password.as_bytes())?;
    output::print_report(&report);

    if report.is_consistent() {
        Ok(())
    } else {
        Err(CitpassError::CommandFailed(format!(
            "store is inconsistent: {} missing entry file(s), {} unindexed file(s)",
            report.dangling.len(),
            report.orphans.len()
        )))
    }
}
