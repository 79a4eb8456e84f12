//! SQLite database adapters for salesdesk.

pub mod bank_repository;
pub mod category_repository;
pub mod client_repository;
pub mod company_repository;
pub mod connection;
pub mod device_repository;
pub mod invoice_repository;
pub mod migrations;
pub mod product_repository;
pub mod user_repository;

pub use bank_repository::SqliteBankRepository;
pub use category_repository::SqliteCategoryRepository;
pub use client_repository::SqliteClientRepository;
pub use company_repository::SqliteCompanyRepository;
pub use connection::{connect, create_test_pool, verify_connection, ConnectionError};
pub use device_repository::SqliteDeviceRepository;
pub use invoice_repository::SqliteInvoiceRepository;
pub use migrations::{Migration, MigrationError, Migrator, EMBEDDED_MIGRATIONS};
pub use product_repository::SqliteProductRepository;
pub use user_repository::SqliteUserRepository;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::DatabaseConfig;

/// Format a timestamp for storage.
///
/// Always microsecond precision with a `Z` suffix, so stored values sort
/// lexically in chronological order.
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Format an optional timestamp for storage.
pub fn format_optional_datetime(dt: Option<DateTime<Utc>>) -> Option<String> {
    dt.map(format_datetime)
}

/// Parse an RFC3339 datetime string from a SQLite row field.
pub fn parse_datetime(s: &str) -> DomainResult<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| DomainError::SerializationError(e.to_string()))
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse an optional RFC3339 datetime string from a SQLite row field.
pub fn parse_optional_datetime(s: Option<String>) -> DomainResult<Option<DateTime<Utc>>> {
    s.map(|s| chrono::DateTime::parse_from_rfc3339(&s).map(|d| d.with_timezone(&Utc)))
        .transpose()
        .map_err(|e| DomainError::SerializationError(e.to_string()))
}

/// Build `?, ?, ?` for an `IN (...)` list of `n` values.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
}

/// Open the pool and bring the schema up to date.
pub async fn initialize_database(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
    let pool = connect(config).await?;
    verify_connection(&pool).await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run(EMBEDDED_MIGRATIONS).await?;
    Ok(pool)
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    let pool = create_test_pool().await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run(EMBEDDED_MIGRATIONS).await?;
    Ok(pool)
}
