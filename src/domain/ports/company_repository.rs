//! Company repository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    Company, CompanyInput, CompanyWithClients, NamedRef, Page, PageRequest, SearchFilter,
};

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    /// `{id, name}` of every company, ordered by name.
    async fn directory(&self) -> DomainResult<Vec<NamedRef>>;

    /// Paginated companies with their linked clients.
    async fn list(
        &self,
        page: PageRequest,
        filter: &SearchFilter,
    ) -> DomainResult<Page<CompanyWithClients>>;

    async fn get(&self, id: i64) -> DomainResult<Option<Company>>;

    async fn create(&self, input: &CompanyInput, now: DateTime<Utc>) -> DomainResult<Company>;

    /// Update the present fields. Fails with `NotFound` when the company is missing.
    async fn update(&self, id: i64, input: &CompanyInput, now: DateTime<Utc>) -> DomainResult<Company>;

    /// Soft-delete the company and drop its client links.
    async fn delete(&self, id: i64, now: DateTime<Utc>) -> DomainResult<()>;
}
