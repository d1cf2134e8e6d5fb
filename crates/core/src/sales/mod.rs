//! Sales module - checkout pipeline, committed sale records, and the unit of
//! work abstraction the storage layer implements for atomic checkouts.

mod checkout;
mod sales_errors;
mod sales_model;
mod sales_service;
mod sales_traits;

#[cfg(test)]
mod sales_service_tests;

pub use checkout::{execute_checkout, CheckoutOrder};
pub use sales_errors::CheckoutError;
pub use sales_model::{
    CheckoutConfig, CheckoutLine, CheckoutReceipt, CheckoutRequest, CheckoutState, LockedProduct,
    NewSale, NewSaleItem, PaymentMethod, SaleItem, SaleSummary, SaleTransaction,
};
pub use sales_service::SaleService;
pub use sales_traits::{
    CheckoutJob, CheckoutStoreTrait, CheckoutUnitOfWork, SaleRepositoryTrait, SaleServiceTrait,
};
