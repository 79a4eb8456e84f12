//! Bank service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Bank, BankInput, NamedRef, Page, PageRequest, SearchFilter};
use crate::domain::ports::BankRepository;

pub struct BankService {
    repository: Arc<dyn BankRepository>,
}

impl BankService {
    pub fn new(repository: Arc<dyn BankRepository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self, page: PageRequest, filter: &SearchFilter) -> DomainResult<Page<Bank>> {
        self.repository.list(page, filter).await
    }

    pub async fn simple(&self) -> DomainResult<Vec<NamedRef>> {
        self.repository.simple().await
    }

    pub async fn get(&self, id: i64) -> DomainResult<Bank> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Bank", id))
    }

    #[instrument(skip(self, input), err)]
    pub async fn create(&self, input: BankInput, now: DateTime<Utc>) -> DomainResult<Bank> {
        let input = input.normalize(true)?;
        self.repository.create(&input, now).await
    }

    #[instrument(skip(self, input), err)]
    pub async fn update(&self, id: i64, input: BankInput, now: DateTime<Utc>) -> DomainResult<Bank> {
        let input = input.normalize(false)?;
        self.repository.update(id, &input, now).await
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: i64, now: DateTime<Utc>) -> DomainResult<()> {
        self.repository.delete(id, now).await
    }
}
