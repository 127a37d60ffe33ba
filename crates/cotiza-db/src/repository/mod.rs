//! # Repositories
//!
//! One repository per aggregate. Each repository owns a clone of the
//! connection pool and exposes `DbResult` async methods.
//!
//! ## Decimal Columns
//! SQLite has no exact decimal type, so monetary columns are TEXT. Row
//! structs carry the raw `String` and the `TryFrom<Row>` conversions parse
//! them with `rust_decimal`; a malformed value surfaces as
//! [`DbError::Decode`](crate::error::DbError::Decode), never a panic.

pub mod client;
pub mod company;
pub mod product;
pub mod promotion;
pub mod quote;
pub mod tax;
pub mod worker;

use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Parses a decimal TEXT column, naming the column on failure.
pub(crate) fn parse_decimal(column: &str, raw: &str) -> DbResult<Decimal> {
    Decimal::from_str(raw).map_err(|e| DbError::Decode(format!("{}: {}", column, e)))
}

/// Generates a new UUID v4 entity id.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Shared Test Fixtures
// =============================================================================
