use citpass::cli::{commands, Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Environment variable controlling log verbosity (e.g. `CITPASS_LOG=debug`).
const LOG_ENV: &str = "CITPASS_LOG";

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for piped passwords.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli),
        Commands::Add => commands::add::execute(&cli),
        Commands::List => commands::list::execute(&cli),
        Commands::Remove { ref title, force } => commands::remove::execute(&cli, title, force),
        Commands::Get {
            ref title,
            all,
            clip,
        } => commands::get::execute(&cli, title, all, clip),
        Commands::Check => commands::check::execute(&cli),
        Commands::Completions { shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        citpass::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
