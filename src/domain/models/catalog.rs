//! Categories, products and inventory movements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A sellable product. Amounts are integer currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub price_cost: i64,
    pub stock: i64,
    pub state: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product fields accepted on create and update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub price_cost: Option<i64>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub state: Option<bool>,
}

impl ProductInput {
    /// Check the fields that are present.
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("product name cannot be empty"));
            }
        }
        for (field, value) in [
            ("price", self.price),
            ("price_cost", self.price_cost),
            ("stock", self.stock),
        ] {
            if matches!(value, Some(v) if v < 0) {
                return Err(DomainError::validation(format!("{field} cannot be negative")));
            }
        }
        Ok(())
    }

    /// Check a payload meant to create a new product.
    pub fn validate_new(&self) -> DomainResult<()> {
        if self.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            return Err(DomainError::validation("product name is required"));
        }
        if self.price.is_none() {
            return Err(DomainError::validation("price is required"));
        }
        self.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    In,
    Out,
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
            Self::Adjustment => "ADJUSTMENT",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "IN" => Some(Self::In),
            "OUT" => Some(Self::Out),
            "ADJUSTMENT" => Some(Self::Adjustment),
            _ => None,
        }
    }
}

/// A recorded change of a product's stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryMovement {
    pub id: i64,
    pub id_product: i64,
    pub quantity_in: i64,
    pub quantity_out: i64,
    pub current_stock: i64,
    pub movement_type: MovementType,
    pub reference_id: Option<i64>,
    pub description: Option<String>,
    pub movement_date: DateTime<Utc>,
}

/// A requested stock change.
#[derive(Debug, Clone, Deserialize)]
pub struct StockChange {
    pub movement_type: MovementType,
    pub quantity: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reference_id: Option<i64>,
}

impl StockChange {
    pub fn validate(&self) -> DomainResult<()> {
        match self.movement_type {
            MovementType::In | MovementType::Out if self.quantity < 1 => {
                Err(DomainError::validation("quantity must be at least 1"))
            }
            MovementType::Adjustment if self.quantity < 0 => {
                Err(DomainError::validation("adjusted stock cannot be negative"))
            }
            _ => Ok(()),
        }
    }

    /// Resulting `(quantity_in, quantity_out, new_stock)` for a product holding `current` units.
    pub fn apply(&self, product: &str, current: i64) -> DomainResult<(i64, i64, i64)> {
        match self.movement_type {
            MovementType::In => {
                let stock = current
                    .checked_add(self.quantity)
                    .ok_or_else(|| DomainError::validation(format!("stock for {product} would overflow")))?;
                Ok((self.quantity, 0, stock))
            }
            MovementType::Out => {
                if current < self.quantity {
                    return Err(DomainError::InsufficientStock {
                        product: product.to_string(),
                        available: current,
                        requested: self.quantity,
                    });
                }
                Ok((0, self.quantity, current - self.quantity))
            }
            MovementType::Adjustment => {
                let delta = self.quantity - current;
                Ok((delta.max(0), (-delta).max(0), self.quantity))
            }
        }
    }
}
