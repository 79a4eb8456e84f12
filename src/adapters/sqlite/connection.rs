//! SQLite connection pool for the configured database file.
//!
//! Every connection runs in WAL mode with foreign keys enforced.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::domain::models::DatabaseConfig;

const IN_MEMORY: &str = ":memory:";
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(3);
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to open database {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Failed to create database directory {0}: {1}")]
    Directory(String, #[source] std::io::Error),
    #[error("Database did not answer: {0}")]
    Unreachable(#[source] sqlx::Error),
}

fn base_options(path: &str) -> Result<SqliteConnectOptions, ConnectionError> {
    let options = if path == IN_MEMORY {
        SqliteConnectOptions::from_str("sqlite::memory:").map_err(|source| ConnectionError::Open {
            path: path.to_string(),
            source,
        })?
    } else {
        ensure_parent_directory(Path::new(path))?;
        SqliteConnectOptions::new().filename(path).create_if_missing(true)
    };

    Ok(options
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT))
}

fn ensure_parent_directory(path: &Path) -> Result<(), ConnectionError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => std::fs::create_dir_all(parent)
            .map_err(|e| ConnectionError::Directory(parent.display().to_string(), e)),
        _ => Ok(()),
    }
}

/// Open a pool over `config.path`, creating the file and its directory when missing.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, ConnectionError> {
    let options = base_options(&config.path)?;

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await
        .map_err(|source| ConnectionError::Open {
            path: config.path.clone(),
            source,
        })
}

/// Single-connection in-memory pool for tests.
pub async fn create_test_pool() -> Result<SqlitePool, ConnectionError> {
    let options = base_options(IN_MEMORY)?.shared_cache(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|source| ConnectionError::Open {
            path: IN_MEMORY.to_string(),
            source,
        })
}

pub async fn verify_connection(pool: &SqlitePool) -> Result<(), ConnectionError> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(ConnectionError::Unreachable)?;
    Ok(())
}
