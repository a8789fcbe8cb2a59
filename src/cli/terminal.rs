//! Reading lines from the terminal, with or without local echo.
//!
//! Interactive terminals get `dialoguer` prompts, which switch echo off
//! for hidden input and restore the terminal themselves.  Piped stdin is
//! read line by line so commands can be scripted.

use std::io::{self, BufRead, IsTerminal, Write};

use zeroize::Zeroizing;

use crate::errors::{CitpassError, Result};

/// Print `prompt` and read one line without echoing it.
pub fn read_hidden_line(prompt: &str) -> Result<Zeroizing<String>> {
    if io::stdin().is_terminal() {
        let line = dialoguer::Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(|e| CitpassError::CommandFailed(format!("password prompt: {e}")))?;
        return Ok(Zeroizing::new(line));
    }

    write_prompt(prompt)?;
    read_line_from(&mut io::stdin().lock())
}

/// Print `prompt` and read one visible line.
pub fn read_visible_line(prompt: &str) -> Result<String> {
    if io::stdin().is_terminal() {
        return dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| CitpassError::CommandFailed(format!("input prompt: {e}")));
    }

    write_prompt(prompt)?;
    let line = read_line_from(&mut io::stdin().lock())?;
    Ok(line.as_str().to_owned())
}

fn write_prompt(prompt: &str) -> Result<()> {
    let mut stderr = io::stderr();
    write!(stderr, "{prompt}: ")?;
    stderr.flush()?;
    Ok(())
}

/// One line from `reader` with the line ending stripped.  EOF before any
/// input counts as a cancelled prompt.
fn read_line_from(reader: &mut impl BufRead) -> Result<Zeroizing<String>> {
    let mut line = Zeroizing::new(String::new());
    if reader.read_line(&mut line)? == 0 {
        return Err(CitpassError::UserCancelled);
    }
    while line.ends_with(['\n', '\r']) {
        line.pop();
    }
    Ok(line)
}
