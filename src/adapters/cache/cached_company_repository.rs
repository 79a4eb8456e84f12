//! Cached wrapper for CompanyRepository.
//!
//! Only the `{id, name}` directory is cached. Every successful write
//! invalidates it since names and membership may change.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::read_through::ReadThrough;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    CacheConfig, Company, CompanyInput, CompanyWithClients, NamedRef, Page, PageRequest, SearchFilter,
};
use crate::domain::ports::CompanyRepository;

const ALL_COMPANIES: &str = "all_companies";

/// Cached company repository decorator.
pub struct CachedCompanyRepository<A: CompanyRepository> {
    inner: Arc<A>,
    directory: ReadThrough<Vec<NamedRef>>,
}

impl<A: CompanyRepository> CachedCompanyRepository<A> {
    pub fn new(inner: Arc<A>, config: &CacheConfig) -> Self {
        Self::with_ttl(inner, Duration::from_secs(config.ttl_secs), config.max_capacity)
    }

    pub fn with_ttl(inner: Arc<A>, ttl: Duration, max_capacity: u64) -> Self {
        Self {
            inner,
            directory: ReadThrough::new(ttl, max_capacity),
        }
    }

    async fn invalidate_directory(&self) {
        self.directory.invalidate(ALL_COMPANIES).await;
    }
}

#[async_trait]
impl<A: CompanyRepository + 'static> CompanyRepository for CachedCompanyRepository<A> {
    async fn directory(&self) -> DomainResult<Vec<NamedRef>> {
        self.directory
            .get_or_load(ALL_COMPANIES, || self.inner.directory())
            .await
    }

    async fn list(
        &self,
        page: PageRequest,
        filter: &SearchFilter,
    ) -> DomainResult<Page<CompanyWithClients>> {
        self.inner.list(page, filter).await
    }

    async fn get(&self, id: i64) -> DomainResult<Option<Company>> {
        self.inner.get(id).await
    }

    async fn create(&self, input: &CompanyInput, now: DateTime<Utc>) -> DomainResult<Company> {
        let result = self.inner.create(input, now).await;
        if result.is_ok() {
            self.invalidate_directory().await;
        }
        result
    }

    async fn update(&self, id: i64, input: &CompanyInput, now: DateTime<Utc>) -> DomainResult<Company> {
        let result = self.inner.update(id, input, now).await;
        if result.is_ok() {
            self.invalidate_directory().await;
        }
        result
    }

    async fn delete(&self, id: i64, now: DateTime<Utc>) -> DomainResult<()> {
        let result = self.inner.delete(id, now).await;
        if result.is_ok() {
            self.invalidate_directory().await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteCompanyRepository};

    async fn setup_test_repo() -> (CachedCompanyRepository<SqliteCompanyRepository>, sqlx::SqlitePool) {
        let pool = create_migrated_test_pool().await.unwrap();
        let inner = Arc::new(SqliteCompanyRepository::new(pool.clone()));
        (
            CachedCompanyRepository::with_ttl(inner, Duration::from_secs(60), 10),
            pool,
        )
    }

    fn named(name: &str) -> CompanyInput {
        CompanyInput {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_directory_is_cached_until_write() {
        let (repo, pool) = setup_test_repo().await;
        repo.create(&named("Alfa"), Utc::now()).await.unwrap();
        assert_eq!(repo.directory().await.unwrap().len(), 1);

        // A row written behind the decorator's back stays invisible while cached.
        sqlx::query("INSERT INTO company (name, created_at, updated_at) VALUES ('Beta', 'x', 'x')")
            .execute(&pool)
            .await
            .unwrap();
        assert_eq!(repo.directory().await.unwrap().len(), 1);

        repo.create(&named("Gamma"), Utc::now()).await.unwrap();
        assert_eq!(repo.directory().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_rename_and_delete_invalidate() {
        let (repo, _) = setup_test_repo().await;
        let company = repo.create(&named("Alfa"), Utc::now()).await.unwrap();
        repo.directory().await.unwrap();

        repo.update(company.id, &named("Omega"), Utc::now()).await.unwrap();
        let names: Vec<_> = repo.directory().await.unwrap().into_iter().filter_map(|c| c.name).collect();
        assert_eq!(names, vec!["Omega"]);

        repo.delete(company.id, Utc::now()).await.unwrap();
        assert!(repo.directory().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_cache() {
        let (repo, _) = setup_test_repo().await;
        repo.create(&named("Alfa"), Utc::now()).await.unwrap();
        let before = repo.directory().await.unwrap();

        assert!(repo.delete(999, Utc::now()).await.is_err());
        assert_eq!(repo.directory().await.unwrap(), before);
    }

    /// Takes its directory snapshot, signals `loaded`, then waits for `gate` before answering.
    struct SlowDirectory {
        inner: SqliteCompanyRepository,
        loaded: tokio::sync::Notify,
        gate: tokio::sync::Notify,
    }

    #[async_trait]
    impl CompanyRepository for SlowDirectory {
        async fn directory(&self) -> DomainResult<Vec<NamedRef>> {
            let snapshot = self.inner.directory().await?;
            self.loaded.notify_one();
            self.gate.notified().await;
            Ok(snapshot)
        }

        async fn list(&self, page: PageRequest, filter: &SearchFilter) -> DomainResult<Page<CompanyWithClients>> {
            self.inner.list(page, filter).await
        }

        async fn get(&self, id: i64) -> DomainResult<Option<Company>> {
            self.inner.get(id).await
        }

        async fn create(&self, input: &CompanyInput, now: DateTime<Utc>) -> DomainResult<Company> {
            self.inner.create(input, now).await
        }

        async fn update(&self, id: i64, input: &CompanyInput, now: DateTime<Utc>) -> DomainResult<Company> {
            self.inner.update(id, input, now).await
        }

        async fn delete(&self, id: i64, now: DateTime<Utc>) -> DomainResult<()> {
            self.inner.delete(id, now).await
        }
    }

    #[tokio::test]
    async fn test_write_during_directory_load_is_not_lost() {
        let pool = create_migrated_test_pool().await.unwrap();
        let slow = Arc::new(SlowDirectory {
            inner: SqliteCompanyRepository::new(pool),
            loaded: tokio::sync::Notify::new(),
            gate: tokio::sync::Notify::new(),
        });
        let repo = CachedCompanyRepository::with_ttl(slow.clone(), Duration::from_secs(60), 10);

        let (stale, created) = tokio::join!(repo.directory(), async {
            slow.loaded.notified().await;
            let created = repo.create(&named("Alfa"), Utc::now()).await;
            slow.gate.notify_one();
            created
        });
        assert!(stale.unwrap().is_empty());
        created.unwrap();

        slow.gate.notify_one();
        assert_eq!(repo.directory().await.unwrap().len(), 1);
    }
}
