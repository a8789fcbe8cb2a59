//! One module per subcommand.

pub mod add;
pub mod check;
pub mod completions;
pub mod get;
pub mod init;
pub mod list;
pub mod remove;
