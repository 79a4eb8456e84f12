//! `salesdesk migrate`.

use anyhow::{Context, Result};

use super::load_config;
use crate::adapters::sqlite::{initialize_database, Migrator};
use crate::cli::types::MigrateArgs;

pub async fn execute(args: MigrateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let pool = initialize_database(&config.database)
        .await
        .context("Failed to initialize database")?;

    let version = Migrator::new(pool.clone())
        .current_version()
        .await
        .context("Failed to read schema version")?;
    pool.close().await;

    println!("Database {} at schema version {version}", config.database.path);
    Ok(())
}
