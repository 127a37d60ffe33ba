//! # Promotion Dispatcher
//!
//! Composes and sends one loyalty promotion, recording history on success.
//!
//! ## Dispatch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Promotion Dispatch                                  │
//! │                                                                         │
//! │  compute_offer(company, product)                                       │
//! │     │  VAT-inclusive price, then the loyalty discount on top           │
//! │     ▼                                                                   │
//! │  compose(company, client, product, offer)                              │
//! │     │  Spanish template: company message + product + prices            │
//! │     ▼                                                                   │
//! │  EmailSender::send("{Company} <system>", client.email, ...)            │
//! │     │                                                                   │
//! │     ├── Ok  ──► append PromotionHistoryEntry (starts the cooldown)     │
//! │     │                                                                   │
//! │     └── Err ──► NO history entry: the client stays eligible and is     │
//! │                 retried on the next pass                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use cotiza_core::money::{format_amount, format_percent};
use cotiza_core::tax::resolve_line_taxes;
use cotiza_core::types::{Client, Company, Product, PromotionHistoryEntry};
use cotiza_db::Database;

use crate::email::{EmailSender, OutboundEmail};
use crate::error::{NotifyError, NotifyResult};

// =============================================================================
// Offer Math
// =============================================================================

/// A computed promotion offer for one product.
#[derive(Debug, Clone)]
pub struct PromotionOffer {
    /// VAT-inclusive unit price before the loyalty discount.
    pub original_price: Decimal,

    /// Price after the loyalty discount.
    pub offer_price: Decimal,

    /// Discount percent, formatted ("5" or "7.5").
    pub discount_text: String,
}

/// Computes the offer for a product under a company's loyalty discount.
///
/// Single-line tax math with the product's primary rate only (promotions
/// quote the VAT-inclusive shelf price; additional taxes and line
/// discounts don't participate), then the loyalty discount on top.
pub fn compute_offer(company: &Company, product: &Product) -> PromotionOffer {
    let taxes = resolve_line_taxes(product.net_price, product.primary_tax_rate, &[]);
    let original_price = taxes.unit_final_price;

    let discount = company.loyalty.discount_percent;
    let discount_amount = original_price * discount / Decimal::ONE_HUNDRED;
    let offer_price = original_price - discount_amount;

    PromotionOffer {
        original_price,
        offer_price,
        discount_text: format_percent(discount),
    }
}

// =============================================================================
// Message Composition
// =============================================================================

/// Short history summary: `Oferta {producto} - {pct}% OFF`.
pub fn offer_summary(product: &Product, offer: &PromotionOffer) -> String {
    format!("Oferta {} - {}% OFF", product.name, offer.discount_text)
}

/// Composes the promotion email for one client.
pub fn compose_promotion(
    company: &Company,
    client: &Client,
    product: &Product,
    offer: &PromotionOffer,
) -> NotifyResult<OutboundEmail> {
    let to = client
        .email
        .clone()
        .ok_or_else(|| NotifyError::MissingRecipient(format!("client {}", client.id)))?;

    let subject = format!("¡Oferta Especial para ti en {}!", company.name);

    let body = format!(
        "{company}:\n\n\
         Hola {client},\n\n\
         {message}\n\n\
         **************************************************\n\
         TE OFRECEMOS: {product}\n\n\
         A solo: {offer} (Precio normal: {original})\n\
         ¡Con un {discount}% de descuento!\n\
         **************************************************\n\n\
         Descripción: {description}\n\n\
         ¡Aprovecha esta oportunidad única!\n\n\
         Atentamente,\n\
         El equipo de {company}\n",
        company = company.name,
        client = client.name,
        message = company.loyalty.message_template,
        product = product.name,
        offer = format_amount(offer.offer_price, &company.currency),
        original = format_amount(offer.original_price, &company.currency),
        discount = offer.discount_text,
        description = product
            .description
            .as_deref()
            .unwrap_or("Sin descripción disponible."),
    );

    Ok(OutboundEmail {
        from_name: company.name.clone(),
        to,
        reply_to: company.email.clone(),
        subject,
        body_text: Some(body),
        body_html: None,
        attachment: None,
    })
}

// =============================================================================
// Dispatch
// =============================================================================

/// Sends one promotion and records it.
///
/// Returns the appended history entry. On send failure the error is
/// returned and NOTHING is recorded - the caller logs and moves on, and
/// the cooldown gate will let the client through again next pass.
pub async fn dispatch(
    db: &Database,
    sender: &dyn EmailSender,
    company: &Company,
    client: &Client,
    product: &Product,
    now: DateTime<Utc>,
) -> NotifyResult<PromotionHistoryEntry> {
    let offer = compute_offer(company, product);
    let email = compose_promotion(company, client, product, &offer)?;

    sender.send(&email).await?;

    let entry = db
        .promotions()
        .append(
            &company.id,
            &client.id,
            now,
            company.loyalty.discount_percent,
            &offer_summary(product, &offer),
        )
        .await?;

    info!(
        company = %company.name,
        client = %client.name,
        product = %product.name,
        "Promotion sent"
    );

    Ok(entry)
}

// =============================================================================
// Unit Tests
// =============================================================================
