use async_trait::async_trait;
use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::promotions_errors::PromotionError;
use super::promotions_model::{CustomerSegmentInfo, NewPromotion, Promotion};
use super::promotions_traits::{PromotionRepositoryTrait, PromotionServiceTrait};
use super::resolver::{resolve_discount, DiscountResolution};
use crate::customers::CustomerRepositoryTrait;
use crate::errors::Result;

/// Service for reading segment promotions and previewing discounts.
pub struct PromotionService {
    repository: Arc<dyn PromotionRepositoryTrait>,
    customer_repository: Arc<dyn CustomerRepositoryTrait>,
}

impl PromotionService {
    pub fn new(
        repository: Arc<dyn PromotionRepositoryTrait>,
        customer_repository: Arc<dyn CustomerRepositoryTrait>,
    ) -> Self {
        Self {
            repository,
            customer_repository,
        }
    }
}

#[async_trait]
impl PromotionServiceTrait for PromotionService {
    fn get_customer_segments(&self, customer_id: &str) -> Result<Vec<CustomerSegmentInfo>> {
        // Surfaces NotFound for unknown customers instead of an empty list.
        self.customer_repository.get_by_id(customer_id)?;
        self.repository.get_customer_segments(customer_id)
    }

    /// Discount the customer would receive on `gross_total` right now.
    ///
    /// Informational only: checkout re-resolves inside its own unit of work.
    fn preview_discount(
        &self,
        customer_id: &str,
        gross_total: Decimal,
    ) -> Result<DiscountResolution> {
        let segments = self.get_customer_segments(customer_id)?;
        let resolution = resolve_discount(
            segments.iter().filter_map(|s| s.promotion.as_ref()),
            gross_total,
        );
        debug!(
            "Previewed discount {} for customer {} on gross {}",
            resolution.discount, customer_id, gross_total
        );
        Ok(resolution)
    }

    fn list_promotions(&self) -> Result<Vec<Promotion>> {
        self.repository.list()
    }

    async fn create_promotion(&self, new_promotion: NewPromotion) -> Result<Promotion> {
        new_promotion.validate()?;
        if self
            .repository
            .get_by_segment(&new_promotion.segment_id)?
            .is_some()
        {
            return Err(PromotionError::SegmentAlreadyHasPromotion {
                segment_id: new_promotion.segment_id,
            }
            .into());
        }
        self.repository.create(new_promotion).await
    }
}
