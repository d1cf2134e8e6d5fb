//! Promotions module - discount rules attached to customer segments and the
//! resolver that turns a customer's memberships into one discount.

mod promotions_errors;
mod promotions_model;
mod promotions_service;
mod promotions_traits;
mod resolver;

pub use promotions_errors::PromotionError;
pub use promotions_model::{CustomerSegmentInfo, NewPromotion, Promotion, PromotionType};
pub use promotions_service::PromotionService;
pub use promotions_traits::{PromotionRepositoryTrait, PromotionServiceTrait};
pub use resolver::{candidate_discount, resolve_discount, DiscountResolution};
