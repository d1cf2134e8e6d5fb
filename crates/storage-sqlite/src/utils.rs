//! Utility functions for SQLite storage operations.
//!
//! Helpers for working with SQLite: chunking to stay under the bound
//! parameter limit, and decoding of decimal columns stored as TEXT.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::errors::StorageError;

/// Maximum number of bound parameters used by a single statement.
///
/// SQLite has a compile-time limit on the number of parameters in a SQL statement,
/// typically around 999 (SQLITE_MAX_VARIABLE_NUMBER). To stay safely under this limit
/// and leave room for other parameters in the query, we use 500 as our chunk size.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Chunk a slice into smaller slices for batch SQLite queries with `IN (...)`.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

/// Chunk rows for a multi-row INSERT binding `columns` parameters per row.
pub fn chunk_rows_for_sqlite<T>(rows: &[T], columns: usize) -> impl Iterator<Item = &[T]> {
    rows.chunks((SQLITE_MAX_PARAMS_CHUNK / columns.max(1)).max(1))
}

/// Parses a monetary TEXT column.
pub fn parse_decimal(value: &str, field: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(value)
        .map_err(|e| StorageError::Decode(format!("{} '{}' is not a decimal: {}", field, value, e)))
}
