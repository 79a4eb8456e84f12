//! Invoice repository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::{InvoiceRecord, NewSale, Page, PageRequest, PaymentFact, SaleFact};

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Write a sale atomically: invoice, detail lines, stock decrements,
    /// inventory movements and payments. Returns the new invoice id.
    ///
    /// Missing client, company or user and insufficient stock roll the
    /// whole sale back.
    async fn create_sale(&self, sale: &NewSale, now: DateTime<Utc>) -> DomainResult<i64>;

    async fn get(&self, id: i64) -> DomainResult<Option<InvoiceRecord>>;

    /// Invoices, newest first.
    async fn list(&self, page: PageRequest) -> DomainResult<Page<InvoiceRecord>>;

    /// Non-return sales dated in `[from, to)`.
    async fn sales_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DomainResult<Vec<SaleFact>>;

    /// Payments of non-return sales dated in `[from, to)`.
    async fn payments_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<PaymentFact>>;
}
