use diesel::prelude::*;
use diesel::SqliteConnection;

use retailpos_core::errors::Error;
use retailpos_core::products::Product;
use retailpos_core::promotions::Promotion;
use retailpos_core::sales::{CheckoutUnitOfWork, LockedProduct, NewSale, SaleTransaction};
use retailpos_core::Result;

use super::model::{SaleDB, SaleItemDB};
use crate::errors::StorageError;
use crate::products::ProductDB;
use crate::promotions::load_active_promotions_for_customer;
use crate::schema::{customers, products, sale_items, sales};
use crate::utils::chunk_rows_for_sqlite;

/// Checkout primitives bound to the writer's open `BEGIN IMMEDIATE`
/// transaction.
///
/// SQLite locks the whole database rather than single rows, so every product
/// read here is already exclusive until the transaction ends.
pub struct SqliteCheckoutUnitOfWork<'a> {
    conn: &'a mut SqliteConnection,
}

impl<'a> SqliteCheckoutUnitOfWork<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        Self { conn }
    }
}

impl CheckoutUnitOfWork for SqliteCheckoutUnitOfWork<'_> {
    fn customer_exists(&mut self, customer_id: &str) -> Result<bool> {
        let found: Option<String> = customers::table
            .find(customer_id)
            .select(customers::id)
            .first(self.conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(found.is_some())
    }

    fn lock_product(&mut self, product_id: &str) -> Result<Option<LockedProduct>> {
        let row = products::table
            .find(product_id)
            .select(ProductDB::as_select())
            .first(self.conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(|row| {
            Product::try_from(row)
                .map(|product| LockedProduct { product })
                .map_err(Error::from)
        })
        .transpose()
    }

    fn set_stock(&mut self, product_id: &str, stock: i32) -> Result<()> {
        let updated = diesel::update(products::table.find(product_id))
            .set(products::stock.eq(stock))
            .execute(self.conn)
            .map_err(StorageError::from)?;
        if updated == 0 {
            return Err(Error::NotFound(format!("Product {}", product_id)));
        }
        Ok(())
    }

    fn customer_promotions(&mut self, customer_id: &str) -> Result<Vec<Promotion>> {
        load_active_promotions_for_customer(self.conn, customer_id)
    }

    fn insert_sale(&mut self, sale: NewSale) -> Result<SaleTransaction> {
        let sale_row = SaleDB::from_new(&sale);
        let item_rows: Vec<SaleItemDB> = sale
            .items
            .iter()
            .map(|item| SaleItemDB::from_new(&sale.id, item))
            .collect();

        diesel::insert_into(sales::table)
            .values(&sale_row)
            .execute(self.conn)
            .map_err(StorageError::from)?;

        for chunk in chunk_rows_for_sqlite(&item_rows, 7) {
            diesel::insert_into(sale_items::table)
                .values(chunk)
                .execute(self.conn)
                .map_err(StorageError::from)?;
        }

        Ok(sale_row.into_domain(item_rows)?)
    }
}
