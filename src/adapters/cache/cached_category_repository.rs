//! Cached wrapper for CategoryRepository using a moka TTL cache.
//!
//! The full category list is cached under a single key. Creating a
//! category invalidates it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::read_through::ReadThrough;

use crate::domain::errors::DomainResult;
use crate::domain::models::{CacheConfig, Category};
use crate::domain::ports::CategoryRepository;

const ALL_CATEGORIES: &str = "all_categories";

/// Cached category repository decorator.
pub struct CachedCategoryRepository<A: CategoryRepository> {
    inner: Arc<A>,
    lists: ReadThrough<Vec<Category>>,
}

impl<A: CategoryRepository> CachedCategoryRepository<A> {
    pub fn new(inner: Arc<A>, config: &CacheConfig) -> Self {
        Self::with_ttl(inner, Duration::from_secs(config.ttl_secs), config.max_capacity)
    }

    pub fn with_ttl(inner: Arc<A>, ttl: Duration, max_capacity: u64) -> Self {
        Self {
            inner,
            lists: ReadThrough::new(ttl, max_capacity),
        }
    }
}

#[async_trait]
impl<A: CategoryRepository + 'static> CategoryRepository for CachedCategoryRepository<A> {
    async fn list(&self) -> DomainResult<Vec<Category>> {
        self.lists.get_or_load(ALL_CATEGORIES, || self.inner.list()).await
    }

    async fn create(&self, name: &str, now: DateTime<Utc>) -> DomainResult<Category> {
        let result = self.inner.create(name, now).await;
        if result.is_ok() {
            self.lists.invalidate(ALL_CATEGORIES).await;
        }
        result
    }
}
