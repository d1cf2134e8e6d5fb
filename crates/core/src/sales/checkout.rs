//! The checkout pipeline executed inside one unit of work.

use chrono::NaiveDateTime;
use log::debug;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::sales_errors::CheckoutError;
use super::sales_model::{
    CheckoutLine, CheckoutReceipt, CheckoutRequest, CheckoutState, LockedProduct, NewSale,
    NewSaleItem, PaymentMethod,
};
use super::sales_traits::CheckoutUnitOfWork;
use crate::errors::{Result, ValidationError};
use crate::promotions::resolve_discount;

/// A checkout request that passed draft validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutOrder {
    pub sale_id: String,
    pub customer_id: String,
    pub operator_id: String,
    pub lines: Vec<CheckoutLine>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

impl CheckoutOrder {
    pub fn from_request(request: CheckoutRequest, operator_id: &str) -> Result<Self> {
        if request.customer_id.trim().is_empty() {
            return Err(ValidationError::MissingField("customer_id".to_string()).into());
        }
        if operator_id.trim().is_empty() {
            return Err(ValidationError::MissingField("operator_id".to_string()).into());
        }
        if request.items.is_empty() {
            return Err(CheckoutError::EmptyCart.into());
        }
        if let Some(line) = request.items.iter().find(|l| l.quantity <= 0) {
            return Err(CheckoutError::InvalidQuantity {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
            }
            .into());
        }
        let payment_method = match request.payment_method.as_deref() {
            Some(method) if !method.trim().is_empty() => method.parse::<PaymentMethod>()?,
            _ => PaymentMethod::default(),
        };

        Ok(Self {
            sale_id: Uuid::new_v4().to_string(),
            customer_id: request.customer_id,
            operator_id: operator_id.to_string(),
            lines: request.items,
            payment_method,
            notes: request.notes.filter(|n| !n.trim().is_empty()),
        })
    }

    /// Total requested quantity per product, in ascending product-id order.
    ///
    /// This is the lock acquisition order: two checkouts sharing products
    /// always lock them in the same sequence.
    pub fn quantities_by_product(&self) -> BTreeMap<&str, i64> {
        let mut quantities = BTreeMap::new();
        for line in &self.lines {
            *quantities.entry(line.product_id.as_str()).or_insert(0i64) += i64::from(line.quantity);
        }
        quantities
    }
}

fn amount_out_of_range(product_id: &str) -> ValidationError {
    ValidationError::InvalidInput(format!(
        "sale total is out of range at product '{}'",
        product_id
    ))
}

fn advance(state: &mut CheckoutState, next: CheckoutState, order: &CheckoutOrder) {
    debug_assert!(state.can_advance_to(next), "{:?} -> {:?}", state, next);
    debug!("Checkout {}: {:?} -> {:?}", order.sale_id, state, next);
    *state = next;
}

/// Validates stock, decrements it, prices the cart, resolves the discount and
/// writes the sale, all through `uow`.
///
/// Returning `Err` at any point leaves nothing behind once the surrounding
/// unit of work rolls back.
pub fn execute_checkout(
    uow: &mut dyn CheckoutUnitOfWork,
    order: &CheckoutOrder,
    now: NaiveDateTime,
) -> Result<CheckoutReceipt> {
    let mut state = CheckoutState::Draft;

    if !uow.customer_exists(&order.customer_id)? {
        return Err(CheckoutError::CustomerNotFound {
            customer_id: order.customer_id.clone(),
        }
        .into());
    }

    let quantities = order.quantities_by_product();
    let mut locked: BTreeMap<&str, LockedProduct> = BTreeMap::new();
    for (&product_id, &requested) in &quantities {
        let lock = uow
            .lock_product(product_id)?
            .ok_or_else(|| CheckoutError::ProductNotFound {
                product_id: product_id.to_string(),
            })?;
        if i64::from(lock.product.stock) < requested {
            return Err(CheckoutError::InsufficientStock {
                product_id: product_id.to_string(),
                product_name: lock.product.name.clone(),
                requested,
                available: lock.product.stock,
            }
            .into());
        }
        locked.insert(product_id, lock);
    }
    advance(&mut state, CheckoutState::ItemsValidated, order);

    for (&product_id, &requested) in &quantities {
        let current = locked[product_id].product.stock;
        // requested <= current, so the difference fits in i32 and is >= 0.
        uow.set_stock(product_id, current - requested as i32)?;
    }

    let mut items = Vec::with_capacity(order.lines.len());
    let mut gross_total = Decimal::ZERO;
    for (idx, line) in order.lines.iter().enumerate() {
        let unit_price = locked[line.product_id.as_str()].product.price;
        let line_total = unit_price
            .checked_mul(Decimal::from(line.quantity))
            .ok_or_else(|| amount_out_of_range(&line.product_id))?;
        gross_total = gross_total
            .checked_add(line_total)
            .ok_or_else(|| amount_out_of_range(&line.product_id))?;
        items.push(NewSaleItem {
            id: Uuid::new_v4().to_string(),
            product_id: line.product_id.clone(),
            line_no: idx as i32 + 1,
            quantity: line.quantity,
            unit_price,
            line_total,
        });
    }

    let promotions = uow.customer_promotions(&order.customer_id)?;
    let resolution = resolve_discount(&promotions, gross_total);
    let net_total = gross_total - resolution.discount;
    advance(&mut state, CheckoutState::Priced, order);

    let sale = uow.insert_sale(NewSale {
        id: order.sale_id.clone(),
        customer_id: order.customer_id.clone(),
        operator_id: order.operator_id.clone(),
        gross_total,
        discount_amount: resolution.discount,
        net_total,
        payment_method: order.payment_method,
        notes: order.notes.clone(),
        created_at: now,
        items,
    })?;

    Ok(CheckoutReceipt {
        transaction_id: sale.id,
        gross_total: sale.gross_total,
        discount_applied: sale.discount_amount,
        net_total: sale.net_total,
        promotion_id: resolution.promotion_id,
        segment_id: resolution.segment_id,
        items: sale.items,
        created_at: sale.created_at,
    })
}
