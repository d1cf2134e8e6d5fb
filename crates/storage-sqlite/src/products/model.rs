//! Database models for products.

use diesel::prelude::*;

use crate::errors::StorageError;
use crate::utils::parse_decimal;
use retailpos_core::products::{NewProduct, Product};

/// Database model for products. `price` is a decimal stored as TEXT.
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProductDB {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub price: String,
    pub stock: i32,
    pub category: Option<String>,
    pub unit: String,
}

impl TryFrom<ProductDB> for Product {
    type Error = StorageError;

    fn try_from(db: ProductDB) -> Result<Self, Self::Error> {
        Ok(Self {
            price: parse_decimal(&db.price, "products.price")?,
            id: db.id,
            sku: db.sku,
            name: db.name,
            stock: db.stock,
            category: db.category,
            unit: db.unit,
        })
    }
}

impl ProductDB {
    pub fn from_new(new_product: NewProduct, id: String) -> Self {
        Self {
            id,
            sku: new_product.sku,
            name: new_product.name,
            price: new_product.price.to_string(),
            stock: new_product.stock,
            category: new_product.category,
            unit: new_product.unit.unwrap_or_else(|| "pcs".to_string()),
        }
    }
}
