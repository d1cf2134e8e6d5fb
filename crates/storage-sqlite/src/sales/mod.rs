//! SQLite storage implementation for committed sales and the checkout unit of work.

mod model;
mod repository;
mod unit_of_work;

pub use model::{SaleDB, SaleItemDB};
pub use repository::SaleRepository;
pub use unit_of_work::SqliteCheckoutUnitOfWork;
