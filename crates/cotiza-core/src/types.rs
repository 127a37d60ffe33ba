//! # Domain Types
//!
//! Core domain types used throughout Cotiza.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Company      │   │    Product      │   │     Quote       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  currency cfg   │   │  net_price      │   │  sequence_number│       │
//! │  │  loyalty cfg    │   │  primary rate   │   │  status         │       │
//! │  │  whatsapp cfg   │   │  tax refs       │   │  line items     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ TaxDefinition   │   │   QuoteStatus   │   │PromotionHistory │       │
//! │  │  ─────────────  │   │  ─────────────  │   │     Entry       │       │
//! │  │  kind (% / $)   │   │  Draft          │   │  ─────────────  │       │
//! │  │  basis (net /   │   │  Sent → Opened  │   │  sent_at        │       │
//! │  │   gross+primary)│   │  Accepted       │   │  discount       │       │
//! │  └─────────────────┘   │  Rejected       │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Multi-Tenancy
//! Every aggregate carries a `company_id`. Companies never see each other's
//! products, clients, quotes, taxes or promotion history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Tax Kind / Basis
// =============================================================================

/// How a tax value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum TaxKind {
    /// Percentage of the base amount (e.g., 10 means 10%).
    Percentage,
    /// Fixed amount added per unit, regardless of price.
    Fixed,
}

/// The base an additional tax applies to.
///
/// Chilean-style specific taxes come in two flavors: charged on the net
/// price before VAT, or charged on the VAT-inclusive total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TaxBasis {
    /// Applied on the net unit price, before the primary tax.
    OnNet,
    /// Applied on net + ON_NET taxes + primary tax.
    OnGrossWithPrimary,
}

// =============================================================================
// Tax Definition
// =============================================================================

/// A company-owned additional tax definition.
///
/// Products reference these either as a single "primary additional" tax
/// or as a structured set. Deleting a definition nulls the primary link
/// on referencing products (SET NULL at the schema level).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxDefinition {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Company this definition belongs to.
    pub company_id: String,

    /// Display name shown on quote documents (e.g., "Imp. Bebidas").
    pub name: String,

    /// Percentage or fixed amount.
    pub kind: TaxKind,

    /// Tax value: percent points for Percentage, an amount for Fixed.
    pub value: Decimal,

    /// Base the tax applies to.
    pub basis: TaxBasis,

    /// When the definition was created.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Company
// =============================================================================

/// Currency display settings for a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencySettings {
    /// Symbol shown before amounts (e.g., "$").
    pub symbol: String,

    /// ISO-ish currency code (e.g., "CLP").
    pub code: String,

    /// Decimal places shown. CLP uses 0.
    pub decimals: u32,
}

impl Default for CurrencySettings {
    fn default() -> Self {
        CurrencySettings {
            symbol: "$".to_string(),
            code: "CLP".to_string(),
            decimals: 0,
        }
    }
}

/// Loyalty promotion configuration for a company.
///
/// ## Time Windows
/// Both windows are expressed in seconds:
/// - `start_delay_secs`: how long after a client registers before the first
///   promotion may be sent (inclusive boundary).
/// - `frequency_secs`: minimum spacing between consecutive promotions to the
///   same client (inclusive boundary).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltySettings {
    /// Master switch. When false no promotions are ever sent.
    pub enabled: bool,

    /// Seconds after client registration before the first promotion.
    pub start_delay_secs: i64,

    /// Minimum seconds between promotions to the same client.
    pub frequency_secs: i64,

    /// Discount percent offered in promotions (0-100).
    pub discount_percent: Decimal,

    /// Free-form message inserted into the promotion email body.
    pub message_template: String,
}

impl Default for LoyaltySettings {
    fn default() -> Self {
        LoyaltySettings {
            enabled: false,
            start_delay_secs: 7 * 24 * 3600,
            frequency_secs: 30 * 24 * 3600,
            discount_percent: Decimal::new(5, 0),
            message_template:
                "Te extrañamos. Aquí tienes un descuento especial para tu próxima compra."
                    .to_string(),
        }
    }
}

/// WhatsApp Business channel configuration for a company.
///
/// When disabled (or no provider configured), quote sends fall back to the
/// WhatsApp-Web flow where the caller opens a prefilled conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhatsAppSettings {
    /// Whether the Business API channel is enabled.
    pub enabled: bool,

    /// Provider identifier (currently only "twilio" is recognized).
    pub provider: Option<String>,

    /// Sender phone number registered with the provider.
    pub from_number: Option<String>,
}

/// A tenant organization owning products, clients, quotes and taxes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Legal / display name.
    pub name: String,

    /// Tax identifier (RUT).
    pub rut: String,

    /// Contact email. Also the reply-to for outbound quote emails and the
    /// recipient for stale-quote alerts.
    pub email: Option<String>,

    /// Contact phone.
    pub phone: Option<String>,

    /// Street address shown on quote documents.
    pub address: Option<String>,

    /// Currency display settings.
    pub currency: CurrencySettings,

    /// Loyalty promotion configuration.
    pub loyalty: LoyaltySettings,

    /// WhatsApp channel configuration.
    pub whatsapp: WhatsAppSettings,

    /// When the company was created.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for quoting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Company this product belongs to.
    pub company_id: String,

    /// Display name shown on quotes and promotions.
    pub name: String,

    /// Optional description for promotion emails.
    pub description: Option<String>,

    /// Stock Keeping Unit - optional business identifier, unique when set.
    pub sku: Option<String>,

    /// Net unit price (before any tax).
    pub net_price: Decimal,

    /// Primary value-added tax rate in percent points (19 = 19% IVA).
    pub primary_tax_rate: Decimal,

    /// Legacy fixed specific tax amount. Only applied when no structured
    /// tax is configured; see `tax::TaxSource` for the selection policy.
    pub legacy_fixed_tax: Decimal,

    /// Single selected additional tax (legacy single-reference model).
    pub primary_additional_tax: Option<TaxDefinition>,

    /// Structured set of additional taxes. Takes precedence over
    /// `primary_additional_tax` when non-empty.
    pub additional_taxes: Vec<TaxDefinition>,

    /// Current stock level.
    pub stock: i64,

    /// When the product was created.
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Checks whether the product counts as in stock for promotions.
    ///
    /// Negative stock values are a data artifact and are treated the same
    /// as zero.
    #[inline]
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

// =============================================================================
// Client
// =============================================================================

/// A client (prospective buyer) belonging to a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Company this client belongs to.
    pub company_id: String,

    /// Display name.
    pub name: String,

    /// Email address. Clients without one are skipped by the loyalty pass
    /// and cannot receive quote emails.
    pub email: Option<String>,

    /// Phone number, used for the WhatsApp flow.
    pub phone: Option<String>,

    /// Tax identifier (RUT).
    pub rut: Option<String>,

    /// When the client registered. Immutable; drives the loyalty start
    /// delay. `None` should not occur under normal creation and renders
    /// the client ineligible for promotions.
    pub registered_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Worker
// =============================================================================

/// A salesperson who can author quotes for a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    pub company_id: String,
    /// Name shown as "Vendedor" on documents and exports.
    pub name: String,
    pub email: Option<String>,
}

// =============================================================================
// Quote Status
// =============================================================================

/// Lifecycle status of a quote.
///
/// ## Transitions
/// ```text
/// Draft ──send──► Sent ──pixel──► Opened ──┬──► Accepted
///                   │                      └──► Rejected
///                   └─────────────────────────► Accepted / Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    /// Quote is being edited, not yet delivered.
    Draft,
    /// Quote was emailed / messaged to the client.
    Sent,
    /// The tracking pixel fired: the client opened the email.
    Opened,
    /// Client accepted the quote.
    Accepted,
    /// Client rejected the quote.
    Rejected,
}

impl QuoteStatus {
    /// Spanish label shown on documents and CSV exports.
    pub fn spanish_label(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "Borrador",
            QuoteStatus::Sent => "Enviada",
            QuoteStatus::Opened => "Abierta",
            QuoteStatus::Accepted => "Aceptada",
            QuoteStatus::Rejected => "Rechazada",
        }
    }
}

impl Default for QuoteStatus {
    fn default() -> Self {
        QuoteStatus::Draft
    }
}

// =============================================================================
// Quote
// =============================================================================

/// A priced proposal document sent to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Company this quote belongs to.
    pub company_id: String,

    /// Client the quote is addressed to.
    pub client_id: String,

    /// Authoring salesperson, if any.
    pub worker_id: Option<String>,

    /// Per-company sequence number: dense, monotonically increasing,
    /// assigned exactly once at creation and never reused.
    pub sequence_number: i64,

    /// Lifecycle status.
    pub status: QuoteStatus,

    /// Grand total frozen at creation (denormalized for lists, exports and
    /// alert emails; the authoritative computation is the pricing engine).
    pub total: Decimal,

    /// When the quote was created.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Quote Line Item
// =============================================================================

/// A line item on a quote.
///
/// Uses the snapshot pattern: the net price is frozen at creation so that
/// later product price changes (or product deletion) never alter an
/// existing quote. Tax computation always runs forward from this frozen
/// price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteLineItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Quote this line belongs to.
    pub quote_id: String,

    /// Referenced product. Nullable: the product may have been deleted
    /// after the quote was created (SET NULL at the schema level).
    pub product_id: Option<String>,

    /// Quantity quoted.
    pub quantity: i64,

    /// Net unit price frozen at quote creation.
    pub unit_net_price: Decimal,

    /// Per-line discount percent (0-100).
    pub discount_percent: Decimal,
}

// =============================================================================
// Promotion History
// =============================================================================

/// One sent loyalty promotion, append-only.
///
/// The most recent entry per (company, client) pair gates future sends
/// via the cooldown window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionHistoryEntry {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Company that sent the promotion.
    pub company_id: String,

    /// Client the promotion was sent to.
    pub client_id: String,

    /// When the promotion email was sent.
    pub sent_at: DateTime<Utc>,

    /// Discount percent offered at send time.
    pub discount_offered: Decimal,

    /// Short human-readable summary (product + discount).
    pub message_summary: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_status_default() {
        assert_eq!(QuoteStatus::default(), QuoteStatus::Draft);
    }

    #[test]
    fn test_quote_status_spanish_labels() {
        assert_eq!(QuoteStatus::Sent.spanish_label(), "Enviada");
        assert_eq!(QuoteStatus::Opened.spanish_label(), "Abierta");
    }

    #[test]
    fn test_currency_defaults_to_clp() {
        let currency = CurrencySettings::default();
        assert_eq!(currency.code, "CLP");
        assert_eq!(currency.decimals, 0);
    }

    #[test]
    fn test_negative_stock_is_out_of_stock() {
        let product = Product {
            id: "p1".to_string(),
            company_id: "c1".to_string(),
            name: "Café".to_string(),
            description: None,
            sku: None,
            net_price: Decimal::new(1000, 0),
            primary_tax_rate: Decimal::new(19, 0),
            legacy_fixed_tax: Decimal::ZERO,
            primary_additional_tax: None,
            additional_taxes: Vec::new(),
            stock: -3,
            created_at: Utc::now(),
        };
        assert!(!product.in_stock());
    }
}
