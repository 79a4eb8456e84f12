//! Sales: validating a sale payload, writing it and rendering invoices.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::instrument;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{InvoiceResponse, InvoiceSummary, Page, PageRequest, SaleRequest};
use crate::domain::ports::InvoiceRepository;

pub struct InvoiceService {
    repository: Arc<dyn InvoiceRepository>,
    offset: FixedOffset,
}

impl InvoiceService {
    /// `offset` is the business local time used to render dates.
    pub fn new(repository: Arc<dyn InvoiceRepository>, offset: FixedOffset) -> Self {
        Self { repository, offset }
    }

    /// Validate and record a sale, answering the invoice as stored.
    #[instrument(skip(self, request), fields(products = request.productos.len()), err)]
    pub async fn create(&self, request: SaleRequest, now: DateTime<Utc>) -> DomainResult<InvoiceResponse> {
        let sale = request.into_new_sale()?;
        let id = self.repository.create_sale(&sale, now).await?;
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> DomainResult<InvoiceResponse> {
        self.repository
            .get(id)
            .await?
            .map(InvoiceResponse::from)
            .ok_or_else(|| DomainError::not_found("Invoice", id))
    }

    /// Invoice summaries, newest first.
    pub async fn list(&self, page: PageRequest) -> DomainResult<Page<InvoiceSummary>> {
        let offset = self.offset;
        Ok(self
            .repository
            .list(page)
            .await?
            .map(|record| InvoiceSummary::from_record(record, offset)))
    }
}
