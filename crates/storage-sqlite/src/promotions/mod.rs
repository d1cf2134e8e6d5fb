//! SQLite storage implementation for segment promotions.

mod model;
mod repository;

pub use model::PromotionDB;
pub use repository::{load_active_promotions_for_customer, PromotionRepository};
