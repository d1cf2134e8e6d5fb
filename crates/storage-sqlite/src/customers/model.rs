//! Database models for customers.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use retailpos_core::customers::Customer;

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::customers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CustomerDB {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<CustomerDB> for Customer {
    fn from(db: CustomerDB) -> Self {
        Self {
            id: db.id,
            name: db.name,
            phone: db.phone,
            email: db.email,
            address: db.address,
            created_at: db.created_at,
        }
    }
}
