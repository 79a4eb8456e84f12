//! Salesdesk entry point.

use clap::Parser;

use salesdesk::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => commands::serve::execute(args).await,
        Commands::Migrate(args) => commands::migrate::execute(args).await,
    }
}
