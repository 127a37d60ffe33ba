//! # Quote Pricing Engine
//!
//! Aggregates tax-resolved line items into per-line subtotals and
//! document-level totals.
//!
//! ## Totals Accumulation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Per-Line Accumulation                               │
//! │                                                                         │
//! │  line_gross    = unit_final_price × quantity                           │
//! │  line_subtotal = line_gross − line_gross × discount%/100               │
//! │                                                                         │
//! │  factor = quantity × (1 − discount%/100)                               │
//! │                                                                         │
//! │  totals.net              += unit_net_price        × factor             │
//! │  totals.additional_taxes += unit additional taxes × factor             │
//! │  totals.primary_tax      += unit primary tax      × factor             │
//! │  totals.grand_total      += line_subtotal                              │
//! │                                                                         │
//! │  NOTE: grand_total sums discounted line subtotals directly while the   │
//! │  component totals are discount-factored per component. Under rounding  │
//! │  the breakdown may drift slightly against grand_total. That is the     │
//! │  documented contract of this engine - both numbers are produced as     │
//! │  specified and consumers must not reconcile them.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The output `PricedQuote` is consumed verbatim by the PDF and CSV
//! rendering collaborators; no further numeric logic happens downstream.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::tax::{resolve_line_taxes, LineTaxes, TaxSource};
use crate::types::{Product, QuoteLineItem};

// =============================================================================
// Constants
// =============================================================================

/// Name shown for lines whose product was deleted after quote creation.
pub const DELETED_PRODUCT_NAME: &str = "Producto eliminado";

/// SKU column placeholder for lines without a SKU (or without a product).
pub const EMPTY_SKU_LABEL: &str = "-";

// =============================================================================
// Input / Output Types
// =============================================================================

/// One line to price: the stored line item plus its product, when it still
/// exists.
#[derive(Debug, Clone, Copy)]
pub struct LineInput<'a> {
    pub item: &'a QuoteLineItem,
    pub product: Option<&'a Product>,
}

/// A fully priced display line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedLine {
    /// SKU shown in the document, `-` when absent.
    pub sku_label: String,

    /// Product name, or the deleted-product sentinel.
    pub product_name: String,

    /// Quantity quoted.
    pub quantity: i64,

    /// Unit price with every tax applied.
    pub unit_final_price: Decimal,

    /// Per-line discount percent (0-100).
    pub discount_percent: Decimal,

    /// Line total after quantity and discount.
    pub line_subtotal: Decimal,
}

/// Document-level totals.
///
/// `net`, `additional_taxes` and `primary_tax` are the display breakdown;
/// `grand_total` is the authoritative amount owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteTotals {
    pub net: Decimal,
    pub additional_taxes: Decimal,
    pub primary_tax: Decimal,
    pub grand_total: Decimal,
}

/// The priced document: everything the PDF and CSV renderers consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedQuote {
    pub lines: Vec<PricedLine>,
    pub totals: QuoteTotals,
}

// =============================================================================
// Pricing
// =============================================================================

/// Prices a quote: resolves taxes per line and accumulates document totals.
///
/// Lines whose product has been deleted are degraded to a placeholder
/// (sentinel name, zero tax, frozen net price passed through) - pricing a
/// historical quote never fails.
///
/// ## Example
/// ```rust
/// use cotiza_core::pricing::{price_quote, LineInput};
/// use cotiza_core::types::QuoteLineItem;
/// use rust_decimal_macros::dec;
///
/// let item = QuoteLineItem {
///     id: "l1".into(),
///     quote_id: "q1".into(),
///     product_id: None,
///     quantity: 2,
///     unit_net_price: dec!(1000),
///     discount_percent: dec!(0),
/// };
/// let priced = price_quote(&[LineInput { item: &item, product: None }]);
/// assert_eq!(priced.totals.grand_total, dec!(2000));
/// ```
pub fn price_quote(lines: &[LineInput<'_>]) -> PricedQuote {
    let mut priced_lines = Vec::with_capacity(lines.len());
    let mut net = Decimal::ZERO;
    let mut additional_taxes = Decimal::ZERO;
    let mut primary_tax = Decimal::ZERO;
    let mut grand_total = Decimal::ZERO;

    for line in lines {
        let (taxes, sku_label, product_name) = resolve_line(line);

        let quantity = Decimal::from(line.item.quantity);
        let discount = line.item.discount_percent;

        let line_gross = taxes.unit_final_price * quantity;
        let line_discount = line_gross * discount / dec!(100);
        let line_subtotal = line_gross - line_discount;

        // The discount is distributed proportionally across the tax
        // components so that the breakdown stays coherent under discounting.
        let factor = quantity * (dec!(1) - discount / dec!(100));

        net += line.item.unit_net_price * factor;
        additional_taxes += taxes.unit_additional_taxes() * factor;
        primary_tax += taxes.unit_primary_tax * factor;
        grand_total += line_subtotal;

        priced_lines.push(PricedLine {
            sku_label,
            product_name,
            quantity: line.item.quantity,
            unit_final_price: taxes.unit_final_price,
            discount_percent: discount,
            line_subtotal,
        });
    }

    PricedQuote {
        lines: priced_lines,
        totals: QuoteTotals {
            net,
            additional_taxes,
            primary_tax,
            grand_total,
        },
    }
}

/// Resolves one line's taxes and display labels.
///
/// Tax computation always starts from the frozen `unit_net_price`; the
/// product only contributes its rate and tax configuration.
fn resolve_line(line: &LineInput<'_>) -> (LineTaxes, String, String) {
    match line.product {
        Some(product) => {
            let source = TaxSource::for_product(product);
            let taxes = resolve_line_taxes(
                line.item.unit_net_price,
                product.primary_tax_rate,
                source.taxes(),
            );
            let sku_label = product
                .sku
                .clone()
                .unwrap_or_else(|| EMPTY_SKU_LABEL.to_string());
            (taxes, sku_label, product.name.clone())
        }
        None => (
            LineTaxes::untaxed(line.item.unit_net_price),
            EMPTY_SKU_LABEL.to_string(),
            DELETED_PRODUCT_NAME.to_string(),
        ),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TaxBasis, TaxDefinition, TaxKind};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn item(quantity: i64, unit_net_price: Decimal, discount_percent: Decimal) -> QuoteLineItem {
        QuoteLineItem {
            id: "l1".to_string(),
            quote_id: "q1".to_string(),
            product_id: Some("p1".to_string()),
            quantity,
            unit_net_price,
            discount_percent,
        }
    }

    fn product(net_price: Decimal, primary_tax_rate: Decimal) -> Product {
        Product {
            id: "p1".to_string(),
            company_id: "c1".to_string(),
            name: "Mesa de Roble".to_string(),
            description: None,
            sku: Some("MR-120".to_string()),
            net_price,
            primary_tax_rate,
            legacy_fixed_tax: dec!(0),
            primary_additional_tax: None,
            additional_taxes: Vec::new(),
            stock: 5,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_single_line_no_discount() {
        let item = item(2, dec!(1000), dec!(0));
        let product = product(dec!(1000), dec!(19));
        let priced = price_quote(&[LineInput {
            item: &item,
            product: Some(&product),
        }]);

        assert_eq!(priced.lines.len(), 1);
        assert_eq!(priced.lines[0].unit_final_price, dec!(1190));
        assert_eq!(priced.lines[0].line_subtotal, dec!(2380));
        assert_eq!(priced.totals.net, dec!(2000));
        assert_eq!(priced.totals.primary_tax, dec!(380));
        assert_eq!(priced.totals.additional_taxes, dec!(0));
        assert_eq!(priced.totals.grand_total, dec!(2380));
    }

    #[test]
    fn test_discount_applies_to_components_and_subtotal() {
        // 1 unit at 1000 net / 19%, 10% discount:
        //   gross 1190, subtotal 1071
        //   factor 0.9 → net 900, primary 171; 900 + 171 = 1071
        let item = item(1, dec!(1000), dec!(10));
        let product = product(dec!(1000), dec!(19));
        let priced = price_quote(&[LineInput {
            item: &item,
            product: Some(&product),
        }]);

        assert_eq!(priced.lines[0].line_subtotal, dec!(1071));
        assert_eq!(priced.totals.net, dec!(900));
        assert_eq!(priced.totals.primary_tax, dec!(171));
        assert_eq!(priced.totals.grand_total, dec!(1071));
        assert_eq!(
            priced.totals.net + priced.totals.primary_tax + priced.totals.additional_taxes,
            priced.totals.grand_total
        );
    }

    #[test]
    fn test_frozen_price_wins_over_current_product_price() {
        // Product price changed to 9999 after the quote froze 1000
        let item = item(1, dec!(1000), dec!(0));
        let product = product(dec!(9999), dec!(19));
        let priced = price_quote(&[LineInput {
            item: &item,
            product: Some(&product),
        }]);

        assert_eq!(priced.totals.net, dec!(1000));
        assert_eq!(priced.totals.grand_total, dec!(1190));
    }

    #[test]
    fn test_deleted_product_yields_placeholder_line() {
        let mut orphan = item(3, dec!(500), dec!(0));
        orphan.product_id = None;

        let priced = price_quote(&[LineInput {
            item: &orphan,
            product: None,
        }]);

        assert_eq!(priced.lines[0].product_name, DELETED_PRODUCT_NAME);
        assert_eq!(priced.lines[0].sku_label, EMPTY_SKU_LABEL);
        assert_eq!(priced.lines[0].unit_final_price, dec!(500));
        assert_eq!(priced.totals.primary_tax, dec!(0));
        assert_eq!(priced.totals.additional_taxes, dec!(0));
        assert_eq!(priced.totals.net, dec!(1500));
        assert_eq!(priced.totals.grand_total, dec!(1500));
    }

    #[test]
    fn test_multi_line_totals_accumulate() {
        let first = item(2, dec!(1000), dec!(0));
        let second = item(1, dec!(1000), dec!(50));
        let product = product(dec!(1000), dec!(19));

        let priced = price_quote(&[
            LineInput {
                item: &first,
                product: Some(&product),
            },
            LineInput {
                item: &second,
                product: Some(&product),
            },
        ]);

        // 2 × 1190 + 0.5 × 1190 = 2975
        assert_eq!(priced.totals.grand_total, dec!(2975));
        // 2 × 1000 + 0.5 × 1000 = 2500
        assert_eq!(priced.totals.net, dec!(2500));
        // 2 × 190 + 0.5 × 190 = 475
        assert_eq!(priced.totals.primary_tax, dec!(475));
    }

    #[test]
    fn test_additional_taxes_in_totals() {
        let item = item(1, dec!(1000), dec!(0));
        let mut product = product(dec!(1000), dec!(19));
        product.additional_taxes = vec![TaxDefinition {
            id: "t1".to_string(),
            company_id: "c1".to_string(),
            name: "Imp. Específico".to_string(),
            kind: TaxKind::Fixed,
            value: dec!(50),
            basis: TaxBasis::OnNet,
            created_at: Utc::now(),
        }];

        let priced = price_quote(&[LineInput {
            item: &item,
            product: Some(&product),
        }]);

        assert_eq!(priced.totals.additional_taxes, dec!(50));
        assert_eq!(priced.totals.primary_tax, dec!(199.5));
        assert_eq!(priced.totals.grand_total, dec!(1249.5));
    }

    #[test]
    fn test_empty_quote_prices_to_zero() {
        let priced = price_quote(&[]);
        assert!(priced.lines.is_empty());
        assert_eq!(priced.totals.grand_total, dec!(0));
        assert_eq!(priced.totals.net, dec!(0));
    }

    #[test]
    fn test_sku_label_falls_back_when_missing() {
        let item = item(1, dec!(100), dec!(0));
        let mut product = product(dec!(100), dec!(19));
        product.sku = None;

        let priced = price_quote(&[LineInput {
            item: &item,
            product: Some(&product),
        }]);
        assert_eq!(priced.lines[0].sku_label, EMPTY_SKU_LABEL);
    }
}
