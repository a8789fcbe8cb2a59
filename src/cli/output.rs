//! Styled status lines and tables for citpass commands.
//!
//! Status lines go to stderr.  Only data a script may want to capture
//! (titles, passwords, tables) is printed on stdout.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::{ConsistencyReport, IndexRow, PasswordEntry};

/// `✓ msg` in green.
pub fn success(msg: &str) {
    eprintln!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// `✗ msg` in red; used for the final error before exit.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// `⚠ msg` in yellow.
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// `ℹ msg` in blue.
pub fn info(msg: &str) {
    eprintln!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Dimmed `→ msg` hint.
pub fn tip(msg: &str) {
    eprintln!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print entry titles, one per line.
pub fn print_titles(rows: &[IndexRow]) {
    if rows.is_empty() {
        info("No entries in this store yet.");
        tip("Run `citpass add` to add your first password.");
        return;
    }

    for row in rows {
        println!("{}", row.title);
    }
}

/// Print every field of an entry as a two-column table.
pub fn print_entry(entry: &PasswordEntry, show_password: bool) {
    let password = if show_password {
        entry.password.as_str()
    } else {
        "********"
    };

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["Title", entry.title.as_str()]);
    table.add_row(vec!["Password", password]);
    table.add_row(vec!["Username", entry.username.as_str()]);
    table.add_row(vec!["URL", entry.url.as_str()]);
    table.add_row(vec!["Notes", entry.notes.as_str()]);

    println!("{table}");
}

/// Print the findings of `citpass check`.
pub fn print_report(report: &ConsistencyReport) {
    if report.is_consistent() {
        success("Index and entry files agree.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Problem", "Identifier", "Title"]);

    for row in &report.dangling {
        table.add_row(vec![
            "missing entry file",
            row.identifier.as_str(),
            row.title.as_str(),
        ]);
    }
    for identifier in &report.orphans {
        table.add_row(vec!["not in index", identifier.as_str(), ""]);
    }

    println!("{table}");
}
