use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;

use super::checkout::{execute_checkout, CheckoutOrder};
use super::sales_model::{CheckoutConfig, CheckoutReceipt, CheckoutRequest, SaleTransaction};
use super::sales_traits::{CheckoutStoreTrait, SaleRepositoryTrait, SaleServiceTrait};
use crate::errors::Result;
use crate::utils::time_utils::now_utc;

/// Service orchestrating checkouts and reading committed sales.
pub struct SaleService {
    store: Arc<dyn CheckoutStoreTrait>,
    repository: Arc<dyn SaleRepositoryTrait>,
    config: CheckoutConfig,
}

impl SaleService {
    pub fn new(
        store: Arc<dyn CheckoutStoreTrait>,
        repository: Arc<dyn SaleRepositoryTrait>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            store,
            repository,
            config,
        }
    }
}

#[async_trait]
impl SaleServiceTrait for SaleService {
    /// Runs a checkout as one unit of work.
    ///
    /// Failures are reported immediately and never retried here: stock and
    /// money writes are not safe to replay blindly.
    async fn checkout(
        &self,
        request: CheckoutRequest,
        operator_id: &str,
    ) -> Result<CheckoutReceipt> {
        let order = CheckoutOrder::from_request(request, operator_id)?;
        let sale_id = order.sale_id.clone();
        let customer_id = order.customer_id.clone();

        let result = self
            .store
            .run_checkout(
                self.config.lock_wait_timeout,
                Box::new(move |uow| execute_checkout(uow, &order, now_utc())),
            )
            .await;

        match &result {
            Ok(receipt) => info!(
                "Checkout {} committed for customer {}: gross {}, discount {}, net {}",
                receipt.transaction_id,
                customer_id,
                receipt.gross_total,
                receipt.discount_applied,
                receipt.net_total
            ),
            Err(e) => warn!(
                "Checkout {} aborted for customer {}: {}",
                sale_id, customer_id, e
            ),
        }
        result
    }

    fn get_sale(&self, sale_id: &str) -> Result<SaleTransaction> {
        self.repository.get_by_id(sale_id)
    }

    fn list_customer_sales(&self, customer_id: &str) -> Result<Vec<SaleTransaction>> {
        self.repository.list_by_customer(customer_id)
    }
}
