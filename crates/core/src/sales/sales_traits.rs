use async_trait::async_trait;
use std::time::Duration;

use crate::errors::Result;
use crate::promotions::Promotion;
use crate::sales::sales_model::{
    CheckoutReceipt, CheckoutRequest, LockedProduct, NewSale, SaleSummary, SaleTransaction,
};

/// Row-level primitives available inside one atomic checkout.
///
/// Implementations run every call against the same open transaction. Locks
/// taken by `lock_product` are held until that transaction commits or rolls
/// back, on every exit path, so callers never release them explicitly.
pub trait CheckoutUnitOfWork {
    fn customer_exists(&mut self, customer_id: &str) -> Result<bool>;

    /// Acquires the exclusive lock on a product row and returns its current
    /// state, or `None` when the product does not exist.
    fn lock_product(&mut self, product_id: &str) -> Result<Option<LockedProduct>>;

    /// Writes the new stock of a product previously returned by `lock_product`.
    fn set_stock(&mut self, product_id: &str, stock: i32) -> Result<()>;

    /// Promotions attached to the customer's current segment memberships.
    fn customer_promotions(&mut self, customer_id: &str) -> Result<Vec<Promotion>>;

    fn insert_sale(&mut self, sale: NewSale) -> Result<SaleTransaction>;
}

/// Work executed inside a single unit of work. An `Err` rolls everything back.
pub type CheckoutJob =
    Box<dyn FnOnce(&mut dyn CheckoutUnitOfWork) -> Result<CheckoutReceipt> + Send + 'static>;

/// Executes checkout jobs atomically against the shared store.
#[async_trait]
pub trait CheckoutStoreTrait: Send + Sync {
    /// Runs `job` in one unit of work. A job that cannot start within
    /// `lock_wait` fails with `Error::ConcurrencyConflict` and writes nothing.
    async fn run_checkout(&self, lock_wait: Duration, job: CheckoutJob) -> Result<CheckoutReceipt>;
}

/// Trait for committed sale reads
pub trait SaleRepositoryTrait: Send + Sync {
    fn get_by_id(&self, sale_id: &str) -> Result<SaleTransaction>;
    fn list_by_customer(&self, customer_id: &str) -> Result<Vec<SaleTransaction>>;
    /// Every committed sale, reduced to what the RFM aggregator needs.
    fn load_sale_summaries(&self) -> Result<Vec<SaleSummary>>;
}

/// Trait for sale service operations
#[async_trait]
pub trait SaleServiceTrait: Send + Sync {
    async fn checkout(&self, request: CheckoutRequest, operator_id: &str)
        -> Result<CheckoutReceipt>;
    fn get_sale(&self, sale_id: &str) -> Result<SaleTransaction>;
    fn list_customer_sales(&self, customer_id: &str) -> Result<Vec<SaleTransaction>>;
}
