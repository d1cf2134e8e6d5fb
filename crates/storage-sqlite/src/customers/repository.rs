use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use retailpos_core::customers::{Customer, CustomerRepositoryTrait, NewCustomer};
use retailpos_core::errors::{Error, ValidationError};
use retailpos_core::utils::time_utils::now_utc;
use retailpos_core::Result;

use super::model::CustomerDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::customers;

pub struct CustomerRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl CustomerRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        CustomerRepository { pool, writer }
    }
}

#[async_trait]
impl CustomerRepositoryTrait for CustomerRepository {
    fn get_by_id(&self, customer_id: &str) -> Result<Customer> {
        let mut conn = get_connection(&self.pool)?;
        customers::table
            .find(customer_id)
            .select(CustomerDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(Customer::from)
            .ok_or_else(|| Error::NotFound(format!("Customer {}", customer_id)))
    }

    fn list(&self) -> Result<Vec<Customer>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = customers::table
            .order((customers::name.asc(), customers::id.asc()))
            .select(CustomerDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn create(&self, new_customer: NewCustomer) -> Result<Customer> {
        if new_customer.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()).into());
        }
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Customer> {
                let row = CustomerDB {
                    id: new_customer
                        .id
                        .unwrap_or_else(|| Uuid::new_v4().to_string()),
                    name: new_customer.name,
                    phone: new_customer.phone,
                    email: new_customer.email,
                    address: new_customer.address,
                    created_at: now_utc(),
                };
                let saved = diesel::insert_into(customers::table)
                    .values(&row)
                    .returning(CustomerDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Customer::from(saved))
            })
            .await
    }
}
