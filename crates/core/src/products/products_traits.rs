use crate::errors::Result;
use crate::products::products_model::{NewProduct, Product};
use async_trait::async_trait;

/// Trait for product repository operations.
///
/// Stock is deliberately absent here: it is mutated only through the checkout
/// unit of work, under its lock discipline.
#[async_trait]
pub trait ProductRepositoryTrait: Send + Sync {
    fn get_by_id(&self, product_id: &str) -> Result<Product>;
    fn list(&self) -> Result<Vec<Product>>;
    async fn create(&self, new_product: NewProduct) -> Result<Product>;
}
