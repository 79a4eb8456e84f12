//! `salesdesk serve`.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use super::load_config;
use crate::adapters::http::{AppState, HttpConfig, HttpServer};
use crate::adapters::sqlite::initialize_database;
use crate::cli::types::ServeArgs;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::{LogConfig, LoggerImpl};

pub async fn execute(args: ServeArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    ConfigLoader::validate(&config)?;

    let _logger = LoggerImpl::init(&LogConfig::from_settings(&config.logging)?)?;

    let pool = initialize_database(&config.database)
        .await
        .context("Failed to initialize database")?;

    if config.auth.require_auth {
        tracing::info!("bearer tokens required on business routes");
    }

    let state = Arc::new(AppState::from_pool(pool.clone(), &config));
    let server = HttpServer::new(state, HttpConfig::from(&config.server));
    server
        .serve_with_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow!(e))?;

    pool.close().await;
    tracing::info!("salesdesk stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
