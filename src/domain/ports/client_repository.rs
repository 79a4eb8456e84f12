//! Client repository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    Client, ClientDetail, ClientInput, ClientWithCompanies, Page, PageRequest, SearchFilter,
};

#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Paginated clients. The filter matches the client's name or dni, or
    /// the name or dni of any linked company.
    async fn list(
        &self,
        page: PageRequest,
        filter: &SearchFilter,
    ) -> DomainResult<Page<ClientWithCompanies>>;

    async fn get(&self, id: i64) -> DomainResult<Option<ClientDetail>>;

    /// Insert the client and its company links in one transaction.
    async fn create(&self, input: &ClientInput, now: DateTime<Utc>) -> DomainResult<Client>;

    /// Update the present fields; a present `company_ids` replaces the links.
    async fn update(&self, id: i64, input: &ClientInput, now: DateTime<Utc>) -> DomainResult<()>;

    /// Drop the client's links and soft-delete it.
    async fn delete(&self, id: i64, now: DateTime<Utc>) -> DomainResult<()>;
}
