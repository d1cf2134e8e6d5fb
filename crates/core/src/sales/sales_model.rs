//! Sales domain models.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::sales_errors::CheckoutError;
use crate::products::Product;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Transfer,
    Ewallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Ewallet => "ewallet",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "debit" | "credit" => Ok(PaymentMethod::Card),
            "transfer" | "bank_transfer" => Ok(PaymentMethod::Transfer),
            "ewallet" | "e-wallet" | "qris" => Ok(PaymentMethod::Ewallet),
            other => Err(CheckoutError::UnknownPaymentMethod(other.to_string())),
        }
    }
}

/// Progress of a checkout unit of work.
///
/// `Draft → ItemsValidated → Priced → Committed`, or `Aborted` from any state
/// before `Committed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Draft,
    ItemsValidated,
    Priced,
    Committed,
    Aborted,
}

impl CheckoutState {
    pub fn can_advance_to(self, next: CheckoutState) -> bool {
        matches!(
            (self, next),
            (CheckoutState::Draft, CheckoutState::ItemsValidated)
                | (CheckoutState::ItemsValidated, CheckoutState::Priced)
                | (CheckoutState::Priced, CheckoutState::Committed)
                | (CheckoutState::Draft, CheckoutState::Aborted)
                | (CheckoutState::ItemsValidated, CheckoutState::Aborted)
                | (CheckoutState::Priced, CheckoutState::Aborted)
        )
    }
}

/// One requested cart line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutLine {
    pub product_id: String,
    pub quantity: i32,
}

/// A checkout as submitted by the web layer.
///
/// There is intentionally no discount field: discounts are resolved from the
/// customer's segment memberships inside the unit of work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutRequest {
    pub customer_id: String,
    pub items: Vec<CheckoutLine>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Outcome of a committed checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutReceipt {
    pub transaction_id: String,
    pub gross_total: Decimal,
    pub discount_applied: Decimal,
    pub net_total: Decimal,
    pub promotion_id: Option<String>,
    pub segment_id: Option<String>,
    pub items: Vec<SaleItem>,
    pub created_at: NaiveDateTime,
}

/// A product row held under an exclusive lock for the rest of a unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct LockedProduct {
    pub product: Product,
}

/// Committed sale line. `unit_price` is the price snapshot at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub line_no: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Committed sale. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaleTransaction {
    pub id: String,
    pub customer_id: String,
    pub operator_id: String,
    pub gross_total: Decimal,
    pub discount_amount: Decimal,
    pub net_total: Decimal,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub items: Vec<SaleItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSaleItem {
    pub id: String,
    pub product_id: String,
    pub line_no: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub id: String,
    pub customer_id: String,
    pub operator_id: String,
    pub gross_total: Decimal,
    pub discount_amount: Decimal,
    pub net_total: Decimal,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub items: Vec<NewSaleItem>,
}

/// The slice of a committed sale the RFM aggregator reads.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleSummary {
    pub customer_id: String,
    pub created_at: NaiveDateTime,
    pub net_total: Decimal,
}

#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Longest a checkout may wait for the write lock before it is refused
    /// with a retryable conflict.
    pub lock_wait_timeout: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            lock_wait_timeout: Duration::from_secs(5),
        }
    }
}
