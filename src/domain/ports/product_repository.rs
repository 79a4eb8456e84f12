//! Product and inventory repository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::{InventoryMovement, Product, ProductInput, StockChange};

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list(&self) -> DomainResult<Vec<Product>>;

    async fn get(&self, id: i64) -> DomainResult<Option<Product>>;

    async fn create(&self, input: &ProductInput, now: DateTime<Utc>) -> DomainResult<Product>;

    async fn update(&self, id: i64, input: &ProductInput, now: DateTime<Utc>) -> DomainResult<()>;

    async fn delete(&self, id: i64, now: DateTime<Utc>) -> DomainResult<()>;

    /// Inventory movements of a product, newest first.
    async fn movements(&self, product_id: i64) -> DomainResult<Vec<InventoryMovement>>;

    /// Apply a stock change and record its movement in one transaction.
    async fn apply_stock_change(
        &self,
        product_id: i64,
        change: &StockChange,
        now: DateTime<Utc>,
    ) -> DomainResult<InventoryMovement>;
}
