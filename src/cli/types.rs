//! CLI type definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "salesdesk")]
#[command(about = "Salesdesk - sales, inventory and client management backend", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),

    /// Apply database migrations and print the schema version
    Migrate(MigrateArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Config file to use instead of salesdesk.yaml / salesdesk.local.yaml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Args, Debug, Default)]
pub struct MigrateArgs {
    /// Config file to use instead of salesdesk.yaml / salesdesk.local.yaml
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["salesdesk", "serve", "--port", "8080", "--host", "0.0.0.0"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, Some(8080));
                assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
                assert!(args.config.is_none());
            }
            Commands::Migrate(_) => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_migrate_config() {
        let cli = Cli::try_parse_from(["salesdesk", "migrate", "-c", "prod.yaml"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Migrate(MigrateArgs { config: Some(ref p) }) if p == &PathBuf::from("prod.yaml")
        ));
    }
}
