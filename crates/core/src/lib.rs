//! Retail POS Core - Domain entities, services, and traits.
//!
//! This crate contains the segmentation engine and the promotion-aware
//! checkout pipeline. It is database-agnostic and defines traits that are
//! implemented by the `storage-sqlite` crate.

pub mod constants;
pub mod customers;
pub mod errors;
pub mod products;
pub mod promotions;
pub mod sales;
pub mod segmentation;
pub mod utils;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
