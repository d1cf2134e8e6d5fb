use crate::errors::Result;
use crate::promotions::promotions_model::{CustomerSegmentInfo, NewPromotion, Promotion};
use crate::promotions::resolver::DiscountResolution;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Trait for promotion repository operations
#[async_trait]
pub trait PromotionRepositoryTrait: Send + Sync {
    /// Current memberships of a customer joined with each segment's promotion.
    fn get_customer_segments(&self, customer_id: &str) -> Result<Vec<CustomerSegmentInfo>>;
    fn get_by_segment(&self, segment_id: &str) -> Result<Option<Promotion>>;
    fn list(&self) -> Result<Vec<Promotion>>;
    async fn create(&self, new_promotion: NewPromotion) -> Result<Promotion>;
}

/// Trait for promotion service operations
#[async_trait]
pub trait PromotionServiceTrait: Send + Sync {
    fn get_customer_segments(&self, customer_id: &str) -> Result<Vec<CustomerSegmentInfo>>;
    fn preview_discount(&self, customer_id: &str, gross_total: Decimal)
        -> Result<DiscountResolution>;
    fn list_promotions(&self) -> Result<Vec<Promotion>>;
    async fn create_promotion(&self, new_promotion: NewPromotion) -> Result<Promotion>;
}
