//! # Quote Repository
//!
//! Database operations for quotes and their line items.
//!
//! ## Quote Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Quote Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create() → sequence number assigned atomically,                │
//! │                    line prices frozen, total denormalized              │
//! │                                                                         │
//! │  2. SEND                                                               │
//! │     └── mark_sent() → Draft → Sent (email / WhatsApp delivered)        │
//! │                                                                         │
//! │  3. OPEN (tracking pixel fires)                                        │
//! │     └── mark_opened() → Sent → Opened                                  │
//! │                                                                         │
//! │  4. RESOLVE                                                            │
//! │     └── set_status() → Accepted / Rejected                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Sequence Numbering
//! `create()` increments the company's `next_quote_seq` counter inside the
//! same transaction as the quote insert:
//!
//! ```sql
//! UPDATE companies SET next_quote_seq = next_quote_seq + 1
//! WHERE id = ?1 RETURNING next_quote_seq
//! ```
//!
//! The row update serializes concurrent creations for the SAME company;
//! different companies touch different rows and never block each other.
//! Numbers are dense (1, 2, 3, ...) and never reused, even after a quote
//! is deleted. UNIQUE(company_id, sequence_number) backstops the invariant
//! at the schema level.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::debug;

use cotiza_core::export::QuoteExportRecord;
use cotiza_core::pricing::{price_quote, LineInput, PricedQuote};
use cotiza_core::types::{Product, Quote, QuoteLineItem, QuoteStatus};
use cotiza_core::validation::{validate_discount_percent, validate_line_count, validate_quantity};

use crate::error::{DbError, DbResult};
use crate::repository::product::ProductRepository;
use crate::repository::{new_id, parse_decimal};

// =============================================================================
// Input Types
// =============================================================================

/// One line of a quote being created.
///
/// The unit net price is frozen here - whatever happens to the product
/// afterwards (price change, deletion) the quote keeps this value.
#[derive(Debug, Clone)]
pub struct NewQuoteLine {
    pub product_id: Option<String>,
    pub quantity: i64,
    pub unit_net_price: Decimal,
    pub discount_percent: Decimal,
}

impl NewQuoteLine {
    /// Builds a line from a product, freezing its current net price.
    pub fn from_product(product: &Product, quantity: i64, discount_percent: Decimal) -> Self {
        NewQuoteLine {
            product_id: Some(product.id.clone()),
            quantity,
            unit_net_price: product.net_price,
            discount_percent,
        }
    }
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct QuoteRow {
    id: String,
    company_id: String,
    client_id: String,
    worker_id: Option<String>,
    sequence_number: i64,
    status: QuoteStatus,
    total: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<QuoteRow> for Quote {
    type Error = DbError;

    fn try_from(row: QuoteRow) -> DbResult<Quote> {
        Ok(Quote {
            total: parse_decimal("quotes.total", &row.total)?,
            id: row.id,
            company_id: row.company_id,
            client_id: row.client_id,
            worker_id: row.worker_id,
            sequence_number: row.sequence_number,
            status: row.status,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LineRow {
    id: String,
    quote_id: String,
    product_id: Option<String>,
    quantity: i64,
    unit_net_price: String,
    discount_percent: String,
}

impl TryFrom<LineRow> for QuoteLineItem {
    type Error = DbError;

    fn try_from(row: LineRow) -> DbResult<QuoteLineItem> {
        Ok(QuoteLineItem {
            unit_net_price: parse_decimal("quote_line_items.unit_net_price", &row.unit_net_price)?,
            discount_percent: parse_decimal(
                "quote_line_items.discount_percent",
                &row.discount_percent,
            )?,
            id: row.id,
            quote_id: row.quote_id,
            product_id: row.product_id,
            quantity: row.quantity,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ExportRow {
    sequence_number: i64,
    created_at: DateTime<Utc>,
    status: QuoteStatus,
    total: String,
    client_name: String,
    client_email: Option<String>,
    worker_name: Option<String>,
}

const QUOTE_COLUMNS: &str =
    "id, company_id, client_id, worker_id, sequence_number, status, total, created_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for quote database operations.
#[derive(Debug, Clone)]
pub struct QuoteRepository {
    pool: SqlitePool,
}

impl QuoteRepository {
    /// Creates a new QuoteRepository.
    pub fn new(pool: SqlitePool) -> Self {
        QuoteRepository { pool }
    }

    /// Creates a quote with its line items.
    ///
    /// ## What This Does
    /// 1. Validates line count, quantities and discounts
    /// 2. Prices the lines (frozen prices + current product tax config)
    ///    to denormalize the grand total
    /// 3. In ONE transaction: claims the next per-company sequence number
    ///    and inserts the quote + lines
    ///
    /// Lines referencing a product that no longer exists are kept with a
    /// null product reference; they price as tax-free placeholders.
    pub async fn create(
        &self,
        company_id: &str,
        client_id: &str,
        worker_id: Option<&str>,
        lines: &[NewQuoteLine],
    ) -> DbResult<Quote> {
        validate_line_count(lines.len())?;
        for line in lines {
            validate_quantity(line.quantity)?;
            validate_discount_percent(line.discount_percent)?;
        }

        // Resolve products up front (outside the transaction - reads only).
        let products = self.resolve_products(lines).await?;

        let quote_id = new_id();
        let now = Utc::now();

        let items: Vec<QuoteLineItem> = lines
            .iter()
            .map(|line| {
                // Drop dangling product references so the FK stays honest.
                let product_id = line
                    .product_id
                    .as_ref()
                    .filter(|id| products.contains_key(*id))
                    .cloned();
                QuoteLineItem {
                    id: new_id(),
                    quote_id: quote_id.clone(),
                    product_id,
                    quantity: line.quantity,
                    unit_net_price: line.unit_net_price,
                    discount_percent: line.discount_percent,
                }
            })
            .collect();

        let priced = price_lines(&items, &products);
        let total = priced.totals.grand_total;

        let mut tx = self.pool.begin().await?;

        // Atomic per-company counter: this is what makes sequence numbers
        // dense and duplicate-free under concurrent creation.
        let sequence_number: i64 = sqlx::query_scalar(
            "UPDATE companies SET next_quote_seq = next_quote_seq + 1
             WHERE id = ?1 RETURNING next_quote_seq",
        )
        .bind(company_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Company", company_id))?;

        debug!(
            id = %quote_id,
            company_id = %company_id,
            sequence_number,
            %total,
            "Creating quote"
        );

        sqlx::query(
            r#"
            INSERT INTO quotes (
                id, company_id, client_id, worker_id,
                sequence_number, status, total, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&quote_id)
        .bind(company_id)
        .bind(client_id)
        .bind(worker_id)
        .bind(sequence_number)
        .bind(QuoteStatus::Draft)
        .bind(total.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO quote_line_items (
                    id, quote_id, product_id, quantity, unit_net_price, discount_percent
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&item.id)
            .bind(&item.quote_id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.unit_net_price.to_string())
            .bind(item.discount_percent.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Quote {
            id: quote_id,
            company_id: company_id.to_string(),
            client_id: client_id.to_string(),
            worker_id: worker_id.map(str::to_string),
            sequence_number,
            status: QuoteStatus::Draft,
            total,
            created_at: now,
        })
    }

    /// Gets a quote by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Quote>> {
        let row: Option<QuoteRow> = sqlx::query_as(&format!(
            "SELECT {} FROM quotes WHERE id = ?1",
            QUOTE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Quote::try_from).transpose()
    }

    /// Lists a company's quotes, newest first.
    pub async fn list_by_company(&self, company_id: &str) -> DbResult<Vec<Quote>> {
        let rows: Vec<QuoteRow> = sqlx::query_as(&format!(
            "SELECT {} FROM quotes WHERE company_id = ?1 ORDER BY sequence_number DESC",
            QUOTE_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Quote::try_from).collect()
    }

    /// Gets a quote's line items.
    pub async fn get_lines(&self, quote_id: &str) -> DbResult<Vec<QuoteLineItem>> {
        let rows: Vec<LineRow> = sqlx::query_as(
            "SELECT id, quote_id, product_id, quantity, unit_net_price, discount_percent
             FROM quote_line_items WHERE quote_id = ?1 ORDER BY id",
        )
        .bind(quote_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(QuoteLineItem::try_from).collect()
    }

    /// Prices a stored quote for document rendering.
    ///
    /// Loads the frozen line items plus the current tax configuration of
    /// any surviving products and runs the pricing engine. The result is
    /// exactly what the PDF/CSV collaborators consume.
    pub async fn price(&self, quote_id: &str) -> DbResult<PricedQuote> {
        let items = self.get_lines(quote_id).await?;

        let products_repo = ProductRepository::new(self.pool.clone());
        let mut products: HashMap<String, Product> = HashMap::new();
        for item in &items {
            if let Some(product_id) = &item.product_id {
                if !products.contains_key(product_id) {
                    if let Some(product) = products_repo.get_by_id(product_id).await? {
                        products.insert(product_id.clone(), product);
                    }
                }
            }
        }

        Ok(price_lines(&items, &products))
    }

    /// Marks a quote as sent after a successful delivery.
    ///
    /// Only a Draft transitions; returns whether the status changed.
    /// Re-sending an already-sent quote is allowed and is not an error.
    pub async fn mark_sent(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE quotes SET status = ?2 WHERE id = ?1 AND status = ?3")
            .bind(id)
            .bind(QuoteStatus::Sent)
            .bind(QuoteStatus::Draft)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks a quote as opened when the tracking pixel fires.
    ///
    /// Only a Sent quote transitions; any other status (including unknown
    /// ids - the pixel endpoint must never error) is left untouched.
    pub async fn mark_opened(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE quotes SET status = ?2 WHERE id = ?1 AND status = ?3")
            .bind(id)
            .bind(QuoteStatus::Opened)
            .bind(QuoteStatus::Sent)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sets a quote's status (accept / reject flows).
    pub async fn set_status(&self, id: &str, status: QuoteStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE quotes SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Quote", id));
        }
        Ok(())
    }

    /// Lists quotes still in Sent status created on or before the cutoff.
    ///
    /// Input to the stale-quote alert pass.
    pub async fn list_stale_sent(&self, cutoff: DateTime<Utc>) -> DbResult<Vec<Quote>> {
        let rows: Vec<QuoteRow> = sqlx::query_as(&format!(
            "SELECT {} FROM quotes
             WHERE status = ?1 AND created_at <= ?2
             ORDER BY company_id, sequence_number",
            QUOTE_COLUMNS
        ))
        .bind(QuoteStatus::Sent)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Quote::try_from).collect()
    }

    /// Export records for a company's quotes (CSV feed), newest first.
    pub async fn export_records(&self, company_id: &str) -> DbResult<Vec<QuoteExportRecord>> {
        let rows: Vec<ExportRow> = sqlx::query_as(
            r#"
            SELECT q.sequence_number, q.created_at, q.status, q.total,
                   c.name AS client_name, c.email AS client_email,
                   w.name AS worker_name
            FROM quotes q
            JOIN clients c ON c.id = q.client_id
            LEFT JOIN workers w ON w.id = q.worker_id
            WHERE q.company_id = ?1
            ORDER BY q.sequence_number DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(QuoteExportRecord {
                    total: parse_decimal("quotes.total", &row.total)?,
                    sequence_number: row.sequence_number,
                    created_at: row.created_at,
                    client_name: row.client_name,
                    client_email: row.client_email,
                    worker_name: row.worker_name,
                    status: row.status,
                })
            })
            .collect()
    }

    /// Fetches the products still referenced by a set of new lines.
    async fn resolve_products(
        &self,
        lines: &[NewQuoteLine],
    ) -> DbResult<HashMap<String, Product>> {
        let products_repo = ProductRepository::new(self.pool.clone());
        let mut products = HashMap::new();
        for line in lines {
            if let Some(product_id) = &line.product_id {
                if !products.contains_key(product_id) {
                    if let Some(product) = products_repo.get_by_id(product_id).await? {
                        products.insert(product_id.clone(), product);
                    }
                }
            }
        }
        Ok(products)
    }
}

/// Runs the pricing engine over stored items and their resolved products.
fn price_lines(items: &[QuoteLineItem], products: &HashMap<String, Product>) -> PricedQuote {
    let inputs: Vec<LineInput<'_>> = items
        .iter()
        .map(|item| LineInput {
            item,
            product: item.product_id.as_ref().and_then(|id| products.get(id)),
        })
        .collect();
    price_quote(&inputs)
}

// =============================================================================
// Unit Tests
// =============================================================================
