//! Company service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Company, CompanyInput, CompanyWithClients, NamedRef, Page, PageRequest, SearchFilter,
};
use crate::domain::ports::CompanyRepository;

pub struct CompanyService {
    repository: Arc<dyn CompanyRepository>,
}

impl CompanyService {
    pub fn new(repository: Arc<dyn CompanyRepository>) -> Self {
        Self { repository }
    }

    /// `{id, name}` of every company, ordered by name.
    pub async fn directory(&self) -> DomainResult<Vec<NamedRef>> {
        self.repository.directory().await
    }

    pub async fn list(
        &self,
        page: PageRequest,
        filter: &SearchFilter,
    ) -> DomainResult<Page<CompanyWithClients>> {
        self.repository.list(page, filter).await
    }

    pub async fn get(&self, id: i64) -> DomainResult<Company> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Company", id))
    }

    #[instrument(skip(self, input), err)]
    pub async fn create(&self, input: CompanyInput, now: DateTime<Utc>) -> DomainResult<Company> {
        self.repository.create(&input, now).await
    }

    #[instrument(skip(self, input), err)]
    pub async fn update(&self, id: i64, input: CompanyInput, now: DateTime<Utc>) -> DomainResult<Company> {
        self.repository.update(id, &input, now).await
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: i64, now: DateTime<Utc>) -> DomainResult<()> {
        self.repository.delete(id, now).await
    }
}
