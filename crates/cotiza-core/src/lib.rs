//! # cotiza-core: Pure Business Logic for Cotiza
//!
//! This crate is the **heart** of Cotiza, a multi-tenant quoting system.
//! It contains all business logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cotiza Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/scheduler (pass runner)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           cotiza-notify (email, promos, batch passes)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cotiza-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │    tax    │  │  pricing  │  │  loyalty  │  │   │
//! │  │   │  Company  │  │ TaxSource │  │PricedQuote│  │Eligibility│  │   │
//! │  │   │  Product  │  │ LineTaxes │  │  Totals   │  │   gates   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 cotiza-db (SQLite repositories)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Company, Product, Quote, TaxDefinition, etc.)
//! - [`money`] - Currency display formatting (exact decimals, no floats)
//! - [`tax`] - Per-line tax resolution (net taxes, primary tax, gross taxes)
//! - [`pricing`] - Quote pricing engine (lines + document totals)
//! - [`loyalty`] - Time-windowed promotion eligibility
//! - [`export`] - CSV export rows and month filters
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Exact Decimals**: All monetary values are `rust_decimal::Decimal`
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use cotiza_core::tax::resolve_line_taxes;
//! use rust_decimal_macros::dec;
//!
//! // 1000 net at 19% primary tax, no additional taxes
//! let taxes = resolve_line_taxes(dec!(1000), dec!(19), &[]);
//!
//! assert_eq!(taxes.unit_primary_tax, dec!(190));
//! assert_eq!(taxes.unit_final_price, dec!(1190));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod export;
pub mod loyalty;
pub mod money;
pub mod pricing;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use cotiza_core::Product` instead of
// `use cotiza_core::types::Product`

pub use error::ValidationError;
pub use loyalty::Eligibility;
pub use pricing::{price_quote, PricedQuote};
pub use tax::{resolve_line_taxes, AppliedTax, LineTaxes, TaxSource};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed on a single quote
///
/// ## Business Reason
/// Prevents runaway documents and keeps generated PDFs readable.
/// Can be made configurable per-company in future versions.
pub const MAX_QUOTE_LINES: usize = 100;

/// Maximum quantity of a single line item
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
/// Configurable per-company in future versions.
pub const MAX_LINE_QUANTITY: i64 = 9999;
