//! Database models for sales and sale lines.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::errors::StorageError;
use crate::utils::parse_decimal;
use retailpos_core::sales::{NewSale, NewSaleItem, PaymentMethod, SaleItem, SaleTransaction};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::sales)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SaleDB {
    pub id: String,
    pub customer_id: String,
    pub operator_id: String,
    pub gross_total: String,
    pub discount_amount: String,
    pub net_total: String,
    pub payment_method: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(
    Queryable, Identifiable, Insertable, Selectable, Associations, PartialEq, Debug, Clone,
)]
#[diesel(belongs_to(SaleDB, foreign_key = sale_id))]
#[diesel(table_name = crate::schema::sale_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SaleItemDB {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub line_no: i32,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
}

impl SaleDB {
    pub fn from_new(sale: &NewSale) -> Self {
        Self {
            id: sale.id.clone(),
            customer_id: sale.customer_id.clone(),
            operator_id: sale.operator_id.clone(),
            gross_total: sale.gross_total.to_string(),
            discount_amount: sale.discount_amount.to_string(),
            net_total: sale.net_total.to_string(),
            payment_method: sale.payment_method.as_str().to_string(),
            notes: sale.notes.clone(),
            created_at: sale.created_at,
        }
    }

    /// Builds the domain record from a sale row and its lines.
    pub fn into_domain(self, items: Vec<SaleItemDB>) -> Result<SaleTransaction, StorageError> {
        let payment_method = self
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|e| StorageError::Decode(e.to_string()))?;
        let items = items
            .into_iter()
            .map(SaleItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SaleTransaction {
            gross_total: parse_decimal(&self.gross_total, "sales.gross_total")?,
            discount_amount: parse_decimal(&self.discount_amount, "sales.discount_amount")?,
            net_total: parse_decimal(&self.net_total, "sales.net_total")?,
            payment_method,
            id: self.id,
            customer_id: self.customer_id,
            operator_id: self.operator_id,
            notes: self.notes,
            created_at: self.created_at,
            items,
        })
    }
}

impl SaleItemDB {
    pub fn from_new(sale_id: &str, item: &NewSaleItem) -> Self {
        Self {
            id: item.id.clone(),
            sale_id: sale_id.to_string(),
            product_id: item.product_id.clone(),
            line_no: item.line_no,
            quantity: item.quantity,
            unit_price: item.unit_price.to_string(),
            line_total: item.line_total.to_string(),
        }
    }
}

impl TryFrom<SaleItemDB> for SaleItem {
    type Error = StorageError;

    fn try_from(db: SaleItemDB) -> Result<Self, Self::Error> {
        Ok(Self {
            unit_price: parse_decimal(&db.unit_price, "sale_items.unit_price")?,
            line_total: parse_decimal(&db.line_total, "sale_items.line_total")?,
            id: db.id,
            sale_id: db.sale_id,
            product_id: db.product_id,
            line_no: db.line_no,
            quantity: db.quantity,
        })
    }
}
