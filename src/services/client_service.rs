//! Client service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Client, ClientDetail, ClientInput, ClientWithCompanies, Page, PageRequest, SearchFilter,
};
use crate::domain::ports::ClientRepository;

pub struct ClientService {
    repository: Arc<dyn ClientRepository>,
}

impl ClientService {
    pub fn new(repository: Arc<dyn ClientRepository>) -> Self {
        Self { repository }
    }

    pub async fn list(
        &self,
        page: PageRequest,
        filter: &SearchFilter,
    ) -> DomainResult<Page<ClientWithCompanies>> {
        self.repository.list(page, filter).await
    }

    /// The client and the ids of its linked companies.
    pub async fn get(&self, id: i64) -> DomainResult<ClientDetail> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Client", id))
    }

    #[instrument(skip(self, input), err)]
    pub async fn create(&self, input: ClientInput, now: DateTime<Utc>) -> DomainResult<Client> {
        self.repository.create(&input, now).await
    }

    #[instrument(skip(self, input), err)]
    pub async fn update(&self, id: i64, input: ClientInput, now: DateTime<Utc>) -> DomainResult<()> {
        self.repository.update(id, &input, now).await
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: i64, now: DateTime<Utc>) -> DomainResult<()> {
        self.repository.delete(id, now).await
    }
}
