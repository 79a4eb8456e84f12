//! Embedded, versioned schema migrations.

use sqlx::SqlitePool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Failed to execute migration {version}: {source}")]
    ExecutionError { version: i64, #[source] source: sqlx::Error },
    #[error("Failed to get schema version: {0}")]
    VersionCheckError(#[source] sqlx::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub sql: &'static str,
}

/// Schema and reference data shipped with the binary, in version order.
pub const EMBEDDED_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: include_str!("../../../migrations/001_initial_schema.sql"),
    },
    Migration {
        version: 2,
        description: "Seed user types, invoice states and categories",
        sql: include_str!("../../../migrations/002_seed_reference_data.sql"),
    },
];

const CREATE_VERSION_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    description TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)";

pub struct Migrator {
    pool: SqlitePool,
}

impl Migrator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply every migration newer than the current schema version. Returns how many ran.
    pub async fn run(&self, migrations: &[Migration]) -> Result<usize, MigrationError> {
        sqlx::query(CREATE_VERSION_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|source| MigrationError::ExecutionError { version: 0, source })?;

        let current = self.current_version().await?;
        let mut pending: Vec<&Migration> = migrations.iter().filter(|m| m.version > current).collect();
        pending.sort_by_key(|m| m.version);

        for migration in &pending {
            self.apply(migration).await?;
            tracing::info!(version = migration.version, description = migration.description, "applied migration");
        }

        Ok(pending.len())
    }

    /// Highest applied version, 0 on a fresh database.
    pub async fn current_version(&self) -> Result<i64, MigrationError> {
        let exists: Option<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations'")
                .fetch_optional(&self.pool)
                .await
                .map_err(MigrationError::VersionCheckError)?;
        if exists.is_none() {
            return Ok(0);
        }

        let (version,): (i64,) = sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(MigrationError::VersionCheckError)?;
        Ok(version)
    }

    /// Run one migration and record it, atomically.
    async fn apply(&self, migration: &Migration) -> Result<(), MigrationError> {
        let wrap = |source: sqlx::Error| MigrationError::ExecutionError { version: migration.version, source };

        let mut tx = self.pool.begin().await.map_err(wrap)?;
        sqlx::raw_sql(migration.sql).execute(&mut *tx).await.map_err(wrap)?;
        sqlx::query("INSERT INTO schema_migrations (version, description) VALUES (?, ?)")
            .bind(migration.version)
            .bind(migration.description)
            .execute(&mut *tx)
            .await
            .map_err(wrap)?;
        tx.commit().await.map_err(wrap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_test_pool;

    #[tokio::test]
    async fn test_migrations_apply_once() {
        let pool = create_test_pool().await.unwrap();
        let migrator = Migrator::new(pool.clone());
        assert_eq!(migrator.current_version().await.unwrap(), 0);

        assert_eq!(migrator.run(EMBEDDED_MIGRATIONS).await.unwrap(), 2);
        assert_eq!(migrator.current_version().await.unwrap(), 2);
        assert_eq!(migrator.run(EMBEDDED_MIGRATIONS).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_seed_data_present() {
        let pool = create_test_pool().await.unwrap();
        Migrator::new(pool.clone()).run(EMBEDDED_MIGRATIONS).await.unwrap();

        let (name,): (String,) = sqlx::query_as("SELECT name FROM invoice_state WHERE id = 1")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(name, "Pagado");

        let (types,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM type_user")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(types >= 1);
    }

    #[tokio::test]
    async fn test_failed_migration_is_not_recorded() {
        let pool = create_test_pool().await.unwrap();
        let migrator = Migrator::new(pool.clone());
        let broken = Migration {
            version: 1,
            description: "broken",
            sql: "CREATE TABLE ok_table (id INTEGER); THIS IS NOT SQL;",
        };

        let err = migrator.run(&[broken]).await.unwrap_err();
        assert!(matches!(err, MigrationError::ExecutionError { version: 1, .. }));
        assert_eq!(migrator.current_version().await.unwrap(), 0);
    }
}
