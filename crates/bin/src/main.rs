use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{AccountsCommand, Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("roster=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Accounts(AccountsCommand::List(args)) => commands::accounts::list(&args).await,
        Commands::Accounts(AccountsCommand::Add(args)) => commands::accounts::add(&args).await,
        Commands::Accounts(AccountsCommand::Remove(args)) => {
            commands::accounts::remove(&args).await
        }
        Commands::Accounts(AccountsCommand::Trust(args)) => commands::accounts::trust(&args).await,
        Commands::Fingerprint(args) => commands::fingerprint::run(&args).await,
        Commands::Settings(args) => commands::settings::run(&args).await,
    }
}
