//! Customers module - domain models and repository traits.
//!
//! Customer master data is authored outside this crate; the core only needs
//! to know who exists.

mod customers_model;
mod customers_traits;

pub use customers_model::{Customer, NewCustomer};
pub use customers_traits::CustomerRepositoryTrait;
