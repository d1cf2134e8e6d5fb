//! Products module - domain models and repository traits.

mod products_model;
mod products_traits;

pub use products_model::{NewProduct, Product};
pub use products_traits::ProductRepositoryTrait;
