use crate::customers::customers_model::{Customer, NewCustomer};
use crate::errors::Result;
use async_trait::async_trait;

/// Trait for customer repository operations
#[async_trait]
pub trait CustomerRepositoryTrait: Send + Sync {
    fn get_by_id(&self, customer_id: &str) -> Result<Customer>;
    fn list(&self) -> Result<Vec<Customer>>;
    async fn create(&self, new_customer: NewCustomer) -> Result<Customer>;
}
