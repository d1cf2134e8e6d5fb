//! Product domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// Domain model representing a sellable product.
///
/// `stock` is only ever decremented by checkout while the product is locked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub category: Option<String>,
    pub unit: String,
}

/// Input model for registering a product
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub id: Option<String>,
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub category: Option<String>,
    pub unit: Option<String>,
}

impl NewProduct {
    pub fn validate(&self) -> Result<()> {
        if self.sku.trim().is_empty() {
            return Err(ValidationError::MissingField("sku".to_string()).into());
        }
        if self.price.is_sign_negative() {
            return Err(ValidationError::InvalidInput(format!(
                "Price for product '{}' cannot be negative",
                self.sku
            ))
            .into());
        }
        if self.stock < 0 {
            return Err(ValidationError::InvalidInput(format!(
                "Stock for product '{}' cannot be negative",
                self.sku
            ))
            .into());
        }
        Ok(())
    }
}
