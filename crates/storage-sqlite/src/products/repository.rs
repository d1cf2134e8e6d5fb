use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use retailpos_core::errors::Error;
use retailpos_core::products::{NewProduct, Product, ProductRepositoryTrait};
use retailpos_core::Result;

use super::model::ProductDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::products;

pub struct ProductRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl ProductRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        ProductRepository { pool, writer }
    }
}

#[async_trait]
impl ProductRepositoryTrait for ProductRepository {
    fn get_by_id(&self, product_id: &str) -> Result<Product> {
        let mut conn = get_connection(&self.pool)?;
        let row = products::table
            .find(product_id)
            .select(ProductDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| Error::NotFound(format!("Product {}", product_id)))?;
        Ok(Product::try_from(row)?)
    }

    fn list(&self) -> Result<Vec<Product>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = products::table
            .order(products::sku.asc())
            .select(ProductDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|row| Product::try_from(row).map_err(Error::from))
            .collect()
    }

    async fn create(&self, new_product: NewProduct) -> Result<Product> {
        new_product.validate()?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Product> {
                let id = new_product
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                let row = ProductDB::from_new(new_product, id);
                let saved = diesel::insert_into(products::table)
                    .values(&row)
                    .returning(ProductDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Product::try_from(saved)?)
            })
            .await
    }
}
