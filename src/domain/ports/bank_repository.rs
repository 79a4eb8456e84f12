//! Bank repository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::{Bank, BankInput, NamedRef, Page, PageRequest, SearchFilter};

#[async_trait]
pub trait BankRepository: Send + Sync {
    /// Paginated banks ordered by name.
    async fn list(&self, page: PageRequest, filter: &SearchFilter) -> DomainResult<Page<Bank>>;

    /// `{id, name}` of every bank, ordered by name.
    async fn simple(&self) -> DomainResult<Vec<NamedRef>>;

    async fn get(&self, id: i64) -> DomainResult<Option<Bank>>;

    async fn create(&self, input: &BankInput, now: DateTime<Utc>) -> DomainResult<Bank>;

    async fn update(&self, id: i64, input: &BankInput, now: DateTime<Utc>) -> DomainResult<Bank>;

    async fn delete(&self, id: i64, now: DateTime<Utc>) -> DomainResult<()>;
}
