//! Category repository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::Category;

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// All categories, ordered by name.
    async fn list(&self) -> DomainResult<Vec<Category>>;

    async fn create(&self, name: &str, now: DateTime<Utc>) -> DomainResult<Category>;
}
