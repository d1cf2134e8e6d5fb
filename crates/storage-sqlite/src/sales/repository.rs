use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use retailpos_core::errors::Error;
use retailpos_core::sales::{
    CheckoutJob, CheckoutReceipt, CheckoutStoreTrait, SaleRepositoryTrait, SaleSummary,
    SaleTransaction,
};
use retailpos_core::Result;

use super::model::{SaleDB, SaleItemDB};
use super::unit_of_work::SqliteCheckoutUnitOfWork;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{sale_items, sales};
use crate::utils::{chunk_for_sqlite, parse_decimal};

pub struct SaleRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl SaleRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        SaleRepository { pool, writer }
    }

    fn load_with_items(
        conn: &mut SqliteConnection,
        rows: Vec<SaleDB>,
    ) -> Result<Vec<SaleTransaction>> {
        let ids: Vec<String> = rows.iter().map(|s| s.id.clone()).collect();
        let mut items_by_sale: HashMap<String, Vec<SaleItemDB>> = HashMap::new();
        for chunk in chunk_for_sqlite(&ids) {
            let items = sale_items::table
                .filter(sale_items::sale_id.eq_any(chunk))
                .order((sale_items::sale_id.asc(), sale_items::line_no.asc()))
                .select(SaleItemDB::as_select())
                .load(conn)
                .map_err(StorageError::from)?;
            for item in items {
                items_by_sale
                    .entry(item.sale_id.clone())
                    .or_default()
                    .push(item);
            }
        }

        rows.into_iter()
            .map(|sale| {
                let items = items_by_sale.remove(&sale.id).unwrap_or_default();
                sale.into_domain(items).map_err(Error::from)
            })
            .collect()
    }
}

#[async_trait]
impl CheckoutStoreTrait for SaleRepository {
    async fn run_checkout(&self, lock_wait: Duration, job: CheckoutJob) -> Result<CheckoutReceipt> {
        debug!("Submitting checkout to the writer (lock wait {:?})", lock_wait);
        self.writer
            .exec_with_deadline(
                lock_wait,
                move |conn: &mut SqliteConnection| -> Result<CheckoutReceipt> {
                    let mut uow = SqliteCheckoutUnitOfWork::new(conn);
                    job(&mut uow)
                },
            )
            .await
    }
}

impl SaleRepositoryTrait for SaleRepository {
    fn get_by_id(&self, sale_id: &str) -> Result<SaleTransaction> {
        let mut conn = get_connection(&self.pool)?;
        let row = sales::table
            .find(sale_id)
            .select(SaleDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| Error::NotFound(format!("Sale {}", sale_id)))?;
        Self::load_with_items(&mut conn, vec![row])?
            .pop()
            .ok_or_else(|| Error::NotFound(format!("Sale {}", sale_id)))
    }

    fn list_by_customer(&self, customer_id: &str) -> Result<Vec<SaleTransaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = sales::table
            .filter(sales::customer_id.eq(customer_id))
            .order((sales::created_at.desc(), sales::id.asc()))
            .select(SaleDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        Self::load_with_items(&mut conn, rows)
    }

    fn load_sale_summaries(&self) -> Result<Vec<SaleSummary>> {
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<(String, chrono::NaiveDateTime, String)> = sales::table
            .order((sales::customer_id.asc(), sales::created_at.asc()))
            .select((sales::customer_id, sales::created_at, sales::net_total))
            .load(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|(customer_id, created_at, net_total)| -> Result<SaleSummary> {
                Ok(SaleSummary {
                    net_total: parse_decimal(&net_total, "sales.net_total")?,
                    customer_id,
                    created_at,
                })
            })
            .collect()
    }
}
