//! SQLite implementation of the ProductRepository, including inventory movements.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use super::{format_datetime, parse_datetime};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{InventoryMovement, MovementType, Product, ProductInput, StockChange};
use crate::domain::ports::ProductRepository;

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, price_cost, stock, state, created_at, updated_at";
const MOVEMENT_COLUMNS: &str = "id, id_product, quantity_in, quantity_out, current_stock, movement_type, reference_id, description, movement_date";

#[derive(Clone)]
pub struct SqliteProductRepository {
    pool: SqlitePool,
}

impl SqliteProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// A movement row to insert.
pub(crate) struct MovementRecord<'a> {
    pub product_id: i64,
    pub quantity_in: i64,
    pub quantity_out: i64,
    pub current_stock: i64,
    pub movement_type: MovementType,
    pub reference_id: Option<i64>,
    pub description: Option<&'a str>,
}

/// Insert an inventory movement on an open connection or transaction.
pub(crate) async fn insert_movement(
    conn: &mut SqliteConnection,
    movement: &MovementRecord<'_>,
    stamp: &str,
) -> DomainResult<i64> {
    let id = sqlx::query(
        r#"INSERT INTO inventory (id_product, quantity_in, quantity_out, current_stock, movement_type,
               reference_id, description, movement_date, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(movement.product_id)
    .bind(movement.quantity_in)
    .bind(movement.quantity_out)
    .bind(movement.current_stock)
    .bind(movement.movement_type.as_str())
    .bind(movement.reference_id)
    .bind(movement.description)
    .bind(stamp)
    .bind(stamp)
    .bind(stamp)
    .execute(conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    async fn list(&self) -> DomainResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE deleted_at IS NULL ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get(&self, id: i64) -> DomainResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create(&self, input: &ProductInput, now: DateTime<Utc>) -> DomainResult<Product> {
        let stamp = format_datetime(now);
        let name = input.name.as_deref().map(str::trim).unwrap_or_default();
        let id = sqlx::query(
            r#"INSERT INTO product (name, description, price, price_cost, stock, state, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(name)
        .bind(&input.description)
        .bind(input.price.unwrap_or_default())
        .bind(input.price_cost.unwrap_or_default())
        .bind(input.stock.unwrap_or_default())
        .bind(input.state.unwrap_or(true))
        .bind(&stamp)
        .bind(&stamp)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", id))
    }

    async fn update(&self, id: i64, input: &ProductInput, now: DateTime<Utc>) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE product SET name = COALESCE(?, name), description = COALESCE(?, description),
               price = COALESCE(?, price), price_cost = COALESCE(?, price_cost),
               stock = COALESCE(?, stock), state = COALESCE(?, state), updated_at = ?
               WHERE id = ? AND deleted_at IS NULL"#,
        )
        .bind(input.name.as_deref().map(str::trim))
        .bind(&input.description)
        .bind(input.price)
        .bind(input.price_cost)
        .bind(input.stock)
        .bind(input.state)
        .bind(format_datetime(now))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Product", id));
        }
        Ok(())
    }

    async fn delete(&self, id: i64, now: DateTime<Utc>) -> DomainResult<()> {
        let stamp = format_datetime(now);
        let result = sqlx::query("UPDATE product SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL")
            .bind(&stamp)
            .bind(&stamp)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Product", id));
        }
        Ok(())
    }

    async fn movements(&self, product_id: i64) -> DomainResult<Vec<InventoryMovement>> {
        let rows: Vec<MovementRow> = sqlx::query_as(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM inventory
             WHERE id_product = ? AND deleted_at IS NULL
             ORDER BY movement_date DESC, id DESC"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn apply_stock_change(
        &self,
        product_id: i64,
        change: &StockChange,
        now: DateTime<Utc>,
    ) -> DomainResult<InventoryMovement> {
        let stamp = format_datetime(now);
        let mut tx = self.pool.begin().await?;

        let product: Option<(String, i64)> =
            sqlx::query_as("SELECT name, stock FROM product WHERE id = ? AND deleted_at IS NULL")
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (name, current) = product.ok_or_else(|| DomainError::not_found("Product", product_id))?;

        let (quantity_in, quantity_out, new_stock) = change.apply(&name, current)?;

        sqlx::query("UPDATE product SET stock = ?, updated_at = ? WHERE id = ?")
            .bind(new_stock)
            .bind(&stamp)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        let record = MovementRecord {
            product_id,
            quantity_in,
            quantity_out,
            current_stock: new_stock,
            movement_type: change.movement_type,
            reference_id: change.reference_id,
            description: change.description.as_deref(),
        };
        let id = insert_movement(&mut *tx, &record, &stamp).await?;
        tx.commit().await?;

        Ok(InventoryMovement {
            id,
            id_product: product_id,
            quantity_in,
            quantity_out,
            current_stock: new_stock,
            movement_type: change.movement_type,
            reference_id: change.reference_id,
            description: change.description.clone(),
            movement_date: parse_datetime(&stamp)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: Option<String>,
    price: i64,
    price_cost: i64,
    stock: i64,
    state: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = DomainError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            price_cost: row.price_cost,
            stock: row.stock,
            state: row.state,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MovementRow {
    id: i64,
    id_product: i64,
    quantity_in: i64,
    quantity_out: i64,
    current_stock: i64,
    movement_type: String,
    reference_id: Option<i64>,
    description: Option<String>,
    movement_date: String,
}

impl TryFrom<MovementRow> for InventoryMovement {
    type Error = DomainError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let movement_type = MovementType::from_str(&row.movement_type).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid movement type: {}", row.movement_type))
        })?;
        Ok(InventoryMovement {
            id: row.id,
            id_product: row.id_product,
            quantity_in: row.quantity_in,
            quantity_out: row.quantity_out,
            current_stock: row.current_stock,
            movement_type,
            reference_id: row.reference_id,
            description: row.description,
            movement_date: parse_datetime(&row.movement_date)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use chrono::Duration;

    async fn setup_test_repo() -> SqliteProductRepository {
        SqliteProductRepository::new(create_migrated_test_pool().await.unwrap())
    }

    fn product(name: &str, stock: i64) -> ProductInput {
        ProductInput {
            name: Some(name.to_string()),
            price: Some(25_000),
            price_cost: Some(12_000),
            stock: Some(stock),
            ..Default::default()
        }
    }

    fn change(movement_type: MovementType, quantity: i64) -> StockChange {
        StockChange {
            movement_type,
            quantity,
            description: Some("test".to_string()),
            reference_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let repo = setup_test_repo().await;
        let created = repo.create(&product("GPS Tracker", 10), Utc::now()).await.unwrap();
        assert!(created.state);
        assert_eq!(created.stock, 10);

        let patch = ProductInput {
            price: Some(27_000),
            ..Default::default()
        };
        repo.update(created.id, &patch, Utc::now()).await.unwrap();
        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.price, 27_000);
        assert_eq!(fetched.name, "GPS Tracker");

        repo.delete(created.id, Utc::now()).await.unwrap();
        assert!(repo.get(created.id).await.unwrap().is_none());
        assert!(repo.list().await.unwrap().is_empty());
        assert!(matches!(
            repo.update(created.id, &patch, Utc::now()).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_stock_changes_record_movements() {
        let repo = setup_test_repo().await;
        let p = repo.create(&product("Chip", 5), Utc::now()).await.unwrap();
        let t0 = Utc::now();

        let m1 = repo.apply_stock_change(p.id, &change(MovementType::In, 3), t0).await.unwrap();
        assert_eq!(m1.current_stock, 8);
        let m2 = repo
            .apply_stock_change(p.id, &change(MovementType::Out, 2), t0 + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!((m2.quantity_out, m2.current_stock), (2, 6));
        let m3 = repo
            .apply_stock_change(p.id, &change(MovementType::Adjustment, 20), t0 + Duration::seconds(2))
            .await
            .unwrap();
        assert_eq!((m3.quantity_in, m3.current_stock), (14, 20));

        assert_eq!(repo.get(p.id).await.unwrap().unwrap().stock, 20);
        let history = repo.movements(p.id).await.unwrap();
        let ids: Vec<_> = history.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![m3.id, m2.id, m1.id]);
    }

    #[tokio::test]
    async fn test_out_beyond_stock_changes_nothing() {
        let repo = setup_test_repo().await;
        let p = repo.create(&product("Chip", 2), Utc::now()).await.unwrap();

        let err = repo
            .apply_stock_change(p.id, &change(MovementType::Out, 3), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStock { available: 2, requested: 3, .. }));
        assert_eq!(repo.get(p.id).await.unwrap().unwrap().stock, 2);
        assert!(repo.movements(p.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stock_change_on_missing_product() {
        let repo = setup_test_repo().await;
        let err = repo
            .apply_stock_change(77, &change(MovementType::In, 1), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
