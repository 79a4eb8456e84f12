//! SQLite implementation of the CategoryRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::format_datetime;
use crate::domain::errors::DomainResult;
use crate::domain::models::Category;
use crate::domain::ports::CategoryRepository;

#[derive(Clone)]
pub struct SqliteCategoryRepository {
    pool: SqlitePool,
}

impl SqliteCategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for SqliteCategoryRepository {
    async fn list(&self) -> DomainResult<Vec<Category>> {
        let rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, name FROM category WHERE deleted_at IS NULL ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id, name)| Category { id, name }).collect())
    }

    async fn create(&self, name: &str, now: DateTime<Utc>) -> DomainResult<Category> {
        let stamp = format_datetime(now);
        let id = sqlx::query("INSERT INTO category (name, created_at, updated_at) VALUES (?, ?, ?)")
            .bind(name)
            .bind(&stamp)
            .bind(&stamp)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        Ok(Category {
            id,
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::errors::DomainError;

    #[tokio::test]
    async fn test_create_and_list() {
        let repo = SqliteCategoryRepository::new(create_migrated_test_pool().await.unwrap());
        let seeded = repo.list().await.unwrap().len();

        let created = repo.create("Repuestos", Utc::now()).await.unwrap();
        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), seeded + 1);
        assert!(all.contains(&created));
    }

    #[tokio::test]
    async fn test_duplicate_name_is_conflict() {
        let repo = SqliteCategoryRepository::new(create_migrated_test_pool().await.unwrap());
        repo.create("Repuestos", Utc::now()).await.unwrap();
        let err = repo.create("Repuestos", Utc::now()).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }
}
