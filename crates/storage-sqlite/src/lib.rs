//! SQLite storage implementation for the retail point of sale.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `retailpos-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for customers, products, promotions, sales and segments
//! - The checkout unit of work, run on the single writer connection
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! The core crate is database-agnostic and works with traits.
//!
//! ```text
//!      core (domain)        server (http)
//!            │                    │
//!            └─────────┬──────────┘
//!                      │
//!                      ▼
//!          storage-sqlite (this crate)
//!                      │
//!                      ▼
//!                  SQLite DB
//! ```
//!
//! Every write goes through [`WriteHandle`], which owns one connection and
//! runs each job inside `BEGIN IMMEDIATE`. That serialization is what makes
//! a checkout's stock check and decrement atomic.

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod customers;
pub mod products;
pub mod promotions;
pub mod sales;
pub mod segmentation;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from retailpos-core for convenience
pub use retailpos_core::errors::{DatabaseError, Error, Result};
