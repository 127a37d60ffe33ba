//! # cotiza-db: Database Layer for Cotiza
//!
//! This crate provides database access for the Cotiza quoting system.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cotiza Data Flow                                │
//! │                                                                         │
//! │  Pass runner / caller                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     cotiza-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (quote.rs,    │    │  (embedded)  │  │   │
//! │  │   │               │    │  product.rs,  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  promotion.rs │    │ 001_init.sql │  │   │
//! │  │   │ Management    │    │  ...)         │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │                       SQLite Database                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (company, product, quote, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cotiza_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let config = DbConfig::new("path/to/cotiza.db");
//! let db = Database::new(config).await?;
//!
//! // Use repositories
//! let companies = db.companies().list_loyalty_enabled().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::client::ClientRepository;
pub use repository::company::CompanyRepository;
pub use repository::product::ProductRepository;
pub use repository::promotion::PromotionRepository;
pub use repository::quote::{NewQuoteLine, QuoteRepository};
pub use repository::tax::TaxRepository;
pub use repository::worker::WorkerRepository;
