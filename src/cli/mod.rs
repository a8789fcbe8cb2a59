//! CLI module — Clap argument parser, prompts, output helpers, and command
//! implementations.

pub mod commands;
pub mod output;
pub mod terminal;

use std::ffi::OsStr;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::StoreConfig;
use crate::errors::{CitpassError, Result};
use crate::vault::{PasswordEntry, PasswordStore};

/// Environment variable holding the master password for scripted use.
pub const PASSWORD_ENV: &str = "CITPASS_PASSWORD";

/// Store location under `$HOME` when nothing else is configured.
const DEFAULT_STORE_SUBDIR: &str = ".local/share/citpass";

/// citpass CLI: encrypted password store.
#[derive(Parser)]
#[command(
    name = "citpass",
    about = "Encrypted password store for the command line",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Password store directory (default: $HOME/.local/share/citpass)
    #[arg(long, env = "CITPASS_DIR", global = true)]
    pub store_dir: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create the store directory and its index
    Init,

    /// Create a password entry
    Add,

    /// List all password entries
    #[command(name = "ls", visible_aliases = ["list", "show"])]
    List,

    /// Remove a password entry
    #[command(name = "rm")]
    Remove {
        /// Entry title
        title: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Retrieve a password
    Get {
        /// Entry title
        title: String,
        /// Show every field, not just the password
        #[arg(short, long)]
        all: bool,
        /// Copy the password to the clipboard instead of printing it
        #[arg(short, long)]
        clip: bool,
    },

    /// Check that the index and the entry files agree
    Check,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Pick the store directory: explicit flag / `CITPASS_DIR` first, then
/// `$HOME/.local/share/citpass`.
pub fn resolve_store_root(explicit: Option<&Path>, home: Option<&OsStr>) -> Result<PathBuf> {
    if let Some(dir) = explicit.filter(|d| !d.as_os_str().is_empty()) {
        return Ok(dir.to_path_buf());
    }

    match home.filter(|h| !h.is_empty()) {
        Some(home) => Ok(Path::new(home).join(DEFAULT_STORE_SUBDIR)),
        None => Err(CitpassError::ConfigError(
            "neither CITPASS_DIR nor HOME is set — cannot locate the password store".into(),
        )),
    }
}

/// Build the store handle from the CLI arguments and `citpass.toml`.
pub fn open_store(cli: &Cli) -> Result<PasswordStore> {
    let home = std::env::var_os("HOME");
    let root = resolve_store_root(cli.store_dir.as_deref(), home.as_deref())?;
    let config = StoreConfig::load(root)?;
    Ok(PasswordStore::new(config))
}

/// `true` when stdin is an interactive terminal.
pub fn is_interactive() -> bool {
    io::stdin().is_terminal()
}

fn password_from_env() -> Option<Zeroizing<String>> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

/// Get the master password, from `CITPASS_PASSWORD` or an echo-free prompt.
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_passphrase() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        return Ok(pw);
    }

    let pw = terminal::read_hidden_line("Master password")?;
    if pw.is_empty() {
        return Err(CitpassError::CommandFailed(
            "master password cannot be empty".into(),
        ));
    }
    Ok(pw)
}

/// Prompt for a new master password twice (used during `init`).
///
/// Also respects `CITPASS_PASSWORD` for scripted usage.
pub fn prompt_new_passphrase() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        return Ok(pw);
    }

    let first = terminal::read_hidden_line("Choose master password")?;
    if first.is_empty() {
        return Err(CitpassError::CommandFailed(
            "master password cannot be empty".into(),
        ));
    }
    let second = terminal::read_hidden_line("Confirm master password")?;
    if first != second {
        return Err(CitpassError::PasswordMismatch);
    }
    Ok(first)
}

/// Ask for the fields of a new entry.  The password is read without echo.
pub fn prompt_entry() -> Result<PasswordEntry> {
    let mut entry = PasswordEntry::default();
    entry.title = terminal::read_visible_line("Title")?;
    entry.password = terminal::read_hidden_line("Password")?.as_str().to_owned();
    entry.username = terminal::read_visible_line("Username")?;
    entry.url = terminal::read_visible_line("URL")?;
    entry.notes = terminal::read_visible_line("Notes")?;
    Ok(entry)
}

/// After a title miss, let an interactive user choose an existing title.
pub fn pick_title(store: &PasswordStore, passphrase: &[u8], missing: &str) -> Result<String> {
    let titles = store.titles(passphrase)?;
    if titles.is_empty() {
        return Err(CitpassError::EntryNotFound(missing.to_string()));
    }

    output::warning(&format!("No entry titled '{missing}'."));
    let choice = dialoguer::Select::new()
        .with_prompt("Pick an entry")
        .items(&titles)
        .default(0)
        .interact_opt()
        .map_err(|e| CitpassError::CommandFailed(format!("selection prompt: {e}")))?;

    match choice {
        Some(i) => Ok(titles[i].clone()),
        None => Err(CitpassError::UserCancelled),
    }
}
