//! Categories, products and inventory movements.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Category, InventoryMovement, Product, ProductInput, StockChange};
use crate::domain::ports::{CategoryRepository, ProductRepository};

pub struct CategoryService {
    repository: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(repository: Arc<dyn CategoryRepository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> DomainResult<Vec<Category>> {
        self.repository.list().await
    }

    #[instrument(skip(self), err)]
    pub async fn create(&self, name: Option<String>, now: DateTime<Utc>) -> DomainResult<Category> {
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| DomainError::validation("category name is required"))?;
        self.repository.create(&name, now).await
    }
}

pub struct ProductService {
    repository: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> DomainResult<Vec<Product>> {
        self.repository.list().await
    }

    pub async fn get(&self, id: i64) -> DomainResult<Product> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", id))
    }

    #[instrument(skip(self, input), err)]
    pub async fn create(&self, input: ProductInput, now: DateTime<Utc>) -> DomainResult<Product> {
        input.validate_new()?;
        self.repository.create(&input, now).await
    }

    #[instrument(skip(self, input), err)]
    pub async fn update(&self, id: i64, input: ProductInput, now: DateTime<Utc>) -> DomainResult<()> {
        input.validate()?;
        self.repository.update(id, &input, now).await
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: i64, now: DateTime<Utc>) -> DomainResult<()> {
        self.repository.delete(id, now).await
    }

    /// Movements of an existing product, newest first.
    pub async fn movements(&self, id: i64) -> DomainResult<Vec<InventoryMovement>> {
        self.get(id).await?;
        self.repository.movements(id).await
    }

    #[instrument(skip(self, change), fields(movement = change.movement_type.as_str()), err)]
    pub async fn adjust_stock(
        &self,
        id: i64,
        change: StockChange,
        now: DateTime<Utc>,
    ) -> DomainResult<InventoryMovement> {
        change.validate()?;
        self.repository.apply_stock_change(id, &change, now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteCategoryRepository, SqliteProductRepository};
    use crate::domain::models::MovementType;

    async fn setup_test_service() -> ProductService {
        let pool = create_migrated_test_pool().await.unwrap();
        ProductService::new(Arc::new(SqliteProductRepository::new(pool)))
    }

    fn cable(stock: i64) -> ProductInput {
        ProductInput {
            name: Some("Cable".to_string()),
            price: Some(1_000),
            price_cost: Some(400),
            stock: Some(stock),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_category_name_required() {
        let pool = create_migrated_test_pool().await.unwrap();
        let service = CategoryService::new(Arc::new(SqliteCategoryRepository::new(pool)));
        assert!(matches!(
            service.create(Some("   ".to_string()), Utc::now()).await,
            Err(DomainError::ValidationFailed(_))
        ));
        let created = service.create(Some(" Sensores ".to_string()), Utc::now()).await.unwrap();
        assert_eq!(created.name, "Sensores");
    }

    #[tokio::test]
    async fn test_create_rejects_negative_amounts() {
        let service = setup_test_service().await;
        let err = service.create(cable(-1), Utc::now()).await.unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));

        let missing_name = ProductInput {
            name: None,
            ..cable(1)
        };
        assert!(service.create(missing_name, Utc::now()).await.is_err());
    }

    #[tokio::test]
    async fn test_inventory_flow() {
        let service = setup_test_service().await;
        let product = service.create(cable(10), Utc::now()).await.unwrap();

        let out = StockChange {
            movement_type: MovementType::Out,
            quantity: 4,
            description: Some("merma".to_string()),
            reference_id: None,
        };
        let movement = service.adjust_stock(product.id, out, Utc::now()).await.unwrap();
        assert_eq!(movement.current_stock, 6);

        let adjust = StockChange {
            movement_type: MovementType::Adjustment,
            quantity: 2,
            description: None,
            reference_id: None,
        };
        let movement = service.adjust_stock(product.id, adjust, Utc::now()).await.unwrap();
        assert_eq!((movement.quantity_in, movement.quantity_out), (0, 4));

        assert_eq!(service.get(product.id).await.unwrap().stock, 2);
        assert_eq!(service.movements(product.id).await.unwrap().len(), 2);
        assert!(matches!(
            service.movements(999).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_zero_quantity_rejected() {
        let service = setup_test_service().await;
        let product = service.create(cable(1), Utc::now()).await.unwrap();
        let change = StockChange {
            movement_type: MovementType::In,
            quantity: 0,
            description: None,
            reference_id: None,
        };
        assert!(matches!(
            service.adjust_stock(product.id, change, Utc::now()).await,
            Err(DomainError::ValidationFailed(_))
        ));
    }
}
