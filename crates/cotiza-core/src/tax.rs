//! # Tax Resolver
//!
//! Per-line tax resolution: given a frozen net unit price, the product's
//! primary tax rate and the applicable additional taxes, compute every
//! unit-level tax amount in application order.
//!
//! ## Application Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Forward Tax Computation                            │
//! │                                                                         │
//! │  unit_net_price                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  + ON_NET additional taxes (fixed amount or % of net)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  base_for_primary ──► × primary rate ──► primary tax (IVA)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  gross_with_primary = base + primary tax                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  + ON_GROSS_WITH_PRIMARY taxes (fixed or % of gross)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  unit_final_price                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The computation always runs forward from the line item's frozen net
//! price; it is never reconstructed from the product's current price.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Product, TaxBasis, TaxDefinition, TaxKind};

// =============================================================================
// Applied Tax
// =============================================================================

/// The applied form of a tax: just the fields the resolver needs.
///
/// Using a value type here (rather than `&TaxDefinition`) lets the legacy
/// fixed tax participate without a synthetic definition row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedTax {
    pub kind: TaxKind,
    pub value: Decimal,
    pub basis: TaxBasis,
}

impl AppliedTax {
    /// Builds the applied form of a stored tax definition.
    pub fn from_definition(def: &TaxDefinition) -> Self {
        AppliedTax {
            kind: def.kind,
            value: def.value,
            basis: def.basis,
        }
    }

    /// The tax amount contributed on the given base.
    fn amount_on(&self, base: Decimal) -> Decimal {
        match self.kind {
            TaxKind::Fixed => self.value,
            TaxKind::Percentage => base * self.value / dec!(100),
        }
    }
}

// =============================================================================
// Tax Source Selection
// =============================================================================

/// Which tax configuration applies to a product, resolved once per line.
///
/// ## Priority Policy
/// Exactly one arm applies; the sources are never combined:
/// 1. `Structured`: the product's additional-tax set, when non-empty
/// 2. `Primary`: the single selected additional tax, when set
/// 3. `LegacyFixed`: a synthetic ON_NET fixed tax equal to
///    `legacy_fixed_tax`, when that amount is > 0
/// 4. `None`: no additional taxes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaxSource {
    Structured(Vec<AppliedTax>),
    Primary(AppliedTax),
    LegacyFixed(AppliedTax),
    None,
}

impl TaxSource {
    /// Resolves the tax source for a product per the priority policy.
    pub fn for_product(product: &Product) -> TaxSource {
        if !product.additional_taxes.is_empty() {
            return TaxSource::Structured(
                product
                    .additional_taxes
                    .iter()
                    .map(AppliedTax::from_definition)
                    .collect(),
            );
        }

        if let Some(primary) = &product.primary_additional_tax {
            return TaxSource::Primary(AppliedTax::from_definition(primary));
        }

        if product.legacy_fixed_tax > Decimal::ZERO {
            return TaxSource::LegacyFixed(AppliedTax {
                kind: TaxKind::Fixed,
                value: product.legacy_fixed_tax,
                basis: TaxBasis::OnNet,
            });
        }

        TaxSource::None
    }

    /// The applicable taxes as a slice, empty for `None`.
    pub fn taxes(&self) -> &[AppliedTax] {
        match self {
            TaxSource::Structured(taxes) => taxes,
            TaxSource::Primary(tax) | TaxSource::LegacyFixed(tax) => std::slice::from_ref(tax),
            TaxSource::None => &[],
        }
    }
}

// =============================================================================
// Line Tax Resolution
// =============================================================================

/// Unit-level tax amounts for one quote line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTaxes {
    /// Sum of ON_NET additional taxes per unit.
    pub unit_net_only_taxes: Decimal,

    /// Primary (IVA-style) tax per unit, charged on net + ON_NET taxes.
    pub unit_primary_tax: Decimal,

    /// Net + ON_NET taxes + primary tax per unit.
    pub unit_gross_price: Decimal,

    /// Sum of ON_GROSS_WITH_PRIMARY additional taxes per unit.
    pub unit_post_primary_taxes: Decimal,

    /// Final unit price including every tax.
    pub unit_final_price: Decimal,
}

impl LineTaxes {
    /// Tax-free resolution for placeholder lines (deleted products).
    ///
    /// The frozen net price passes through untouched; every tax component
    /// is zero.
    pub fn untaxed(unit_net_price: Decimal) -> Self {
        LineTaxes {
            unit_net_only_taxes: Decimal::ZERO,
            unit_primary_tax: Decimal::ZERO,
            unit_gross_price: unit_net_price,
            unit_post_primary_taxes: Decimal::ZERO,
            unit_final_price: unit_net_price,
        }
    }

    /// Total additional (non-primary) taxes per unit.
    #[inline]
    pub fn unit_additional_taxes(&self) -> Decimal {
        self.unit_net_only_taxes + self.unit_post_primary_taxes
    }
}

/// Resolves all unit-level tax amounts for one line.
///
/// Pure function: no hidden state, resolving twice with identical inputs
/// yields identical outputs.
///
/// ## Arguments
/// * `unit_net_price` - frozen net unit price from the line item
/// * `primary_tax_rate_percent` - primary tax rate in percent points (19 = 19%)
/// * `taxes` - applicable additional taxes, already selected via
///   [`TaxSource::for_product`]
///
/// ## Example
/// ```rust
/// use cotiza_core::tax::resolve_line_taxes;
/// use rust_decimal_macros::dec;
///
/// let taxes = resolve_line_taxes(dec!(1000), dec!(19), &[]);
/// assert_eq!(taxes.unit_primary_tax, dec!(190));
/// assert_eq!(taxes.unit_final_price, dec!(1190));
/// ```
pub fn resolve_line_taxes(
    unit_net_price: Decimal,
    primary_tax_rate_percent: Decimal,
    taxes: &[AppliedTax],
) -> LineTaxes {
    // 1-2. ON_NET additional taxes, charged on the net price
    let unit_net_only_taxes: Decimal = taxes
        .iter()
        .filter(|t| t.basis == TaxBasis::OnNet)
        .map(|t| t.amount_on(unit_net_price))
        .sum();

    // 3-5. Primary tax on net + ON_NET taxes
    let base_for_primary = unit_net_price + unit_net_only_taxes;
    let unit_primary_tax = base_for_primary * primary_tax_rate_percent / dec!(100);
    let unit_gross_price = base_for_primary + unit_primary_tax;

    // 6. ON_GROSS_WITH_PRIMARY taxes, charged on the gross-with-primary price
    let unit_post_primary_taxes: Decimal = taxes
        .iter()
        .filter(|t| t.basis == TaxBasis::OnGrossWithPrimary)
        .map(|t| t.amount_on(unit_gross_price))
        .sum();

    // 7. Everything in
    let unit_final_price = unit_gross_price + unit_post_primary_taxes;

    LineTaxes {
        unit_net_only_taxes,
        unit_primary_tax,
        unit_gross_price,
        unit_post_primary_taxes,
        unit_final_price,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tax(kind: TaxKind, value: Decimal, basis: TaxBasis) -> AppliedTax {
        AppliedTax { kind, value, basis }
    }

    fn definition(id: &str, kind: TaxKind, value: Decimal, basis: TaxBasis) -> TaxDefinition {
        TaxDefinition {
            id: id.to_string(),
            company_id: "c1".to_string(),
            name: format!("Impuesto {}", id),
            kind,
            value,
            basis,
            created_at: Utc::now(),
        }
    }

    fn product_with(
        legacy_fixed_tax: Decimal,
        primary_additional_tax: Option<TaxDefinition>,
        additional_taxes: Vec<TaxDefinition>,
    ) -> Product {
        Product {
            id: "p1".to_string(),
            company_id: "c1".to_string(),
            name: "Vino Tinto".to_string(),
            description: None,
            sku: Some("VT-750".to_string()),
            net_price: dec!(1000),
            primary_tax_rate: dec!(19),
            legacy_fixed_tax,
            primary_additional_tax,
            additional_taxes,
            stock: 10,
            created_at: Utc::now(),
        }
    }

    use rust_decimal_macros::dec;

    #[test]
    fn test_no_additional_taxes() {
        // 1000 net, 19% primary, nothing else: 190 tax, 1190 final
        let taxes = resolve_line_taxes(dec!(1000), dec!(19), &[]);
        assert_eq!(taxes.unit_net_only_taxes, dec!(0));
        assert_eq!(taxes.unit_primary_tax, dec!(190));
        assert_eq!(taxes.unit_gross_price, dec!(1190));
        assert_eq!(taxes.unit_post_primary_taxes, dec!(0));
        assert_eq!(taxes.unit_final_price, dec!(1190));
    }

    #[test]
    fn test_on_net_fixed_tax_feeds_primary_base() {
        // 1000 net + 50 fixed ON_NET = 1050 base, 19% = 199.5, final 1249.5
        let fixed = [tax(TaxKind::Fixed, dec!(50), TaxBasis::OnNet)];
        let taxes = resolve_line_taxes(dec!(1000), dec!(19), &fixed);
        assert_eq!(taxes.unit_net_only_taxes, dec!(50));
        assert_eq!(taxes.unit_primary_tax, dec!(199.5));
        assert_eq!(taxes.unit_final_price, dec!(1249.5));
    }

    #[test]
    fn test_on_net_percentage_tax() {
        // 10% of 1000 = 100 ON_NET; base 1100, primary 209, final 1309
        let pct = [tax(TaxKind::Percentage, dec!(10), TaxBasis::OnNet)];
        let taxes = resolve_line_taxes(dec!(1000), dec!(19), &pct);
        assert_eq!(taxes.unit_net_only_taxes, dec!(100));
        assert_eq!(taxes.unit_primary_tax, dec!(209));
        assert_eq!(taxes.unit_final_price, dec!(1309));
    }

    #[test]
    fn test_post_primary_percentage_tax() {
        // Gross 1190, 10% on gross = 119, final 1309
        let pct = [tax(TaxKind::Percentage, dec!(10), TaxBasis::OnGrossWithPrimary)];
        let taxes = resolve_line_taxes(dec!(1000), dec!(19), &pct);
        assert_eq!(taxes.unit_gross_price, dec!(1190));
        assert_eq!(taxes.unit_post_primary_taxes, dec!(119));
        assert_eq!(taxes.unit_final_price, dec!(1309));
    }

    #[test]
    fn test_mixed_bases_apply_in_order() {
        let mixed = [
            tax(TaxKind::Fixed, dec!(50), TaxBasis::OnNet),
            tax(TaxKind::Fixed, dec!(30), TaxBasis::OnGrossWithPrimary),
        ];
        let taxes = resolve_line_taxes(dec!(1000), dec!(19), &mixed);
        // base 1050, primary 199.5, gross 1249.5, + 30 fixed = 1279.5
        assert_eq!(taxes.unit_final_price, dec!(1279.5));
        assert_eq!(taxes.unit_additional_taxes(), dec!(80));
    }

    #[test]
    fn test_idempotent() {
        let set = [
            tax(TaxKind::Percentage, dec!(10), TaxBasis::OnNet),
            tax(TaxKind::Fixed, dec!(25), TaxBasis::OnGrossWithPrimary),
        ];
        let first = resolve_line_taxes(dec!(4990), dec!(19), &set);
        let second = resolve_line_taxes(dec!(4990), dec!(19), &set);
        assert_eq!(first, second);
    }

    #[test]
    fn test_final_price_monotone_in_primary_rate() {
        let set = [tax(TaxKind::Percentage, dec!(10), TaxBasis::OnGrossWithPrimary)];
        let mut previous = Decimal::MIN;
        for rate in 0..=40 {
            let taxes = resolve_line_taxes(dec!(1000), Decimal::from(rate), &set);
            assert!(
                taxes.unit_final_price >= previous,
                "final price decreased at rate {}",
                rate
            );
            previous = taxes.unit_final_price;
        }
    }

    #[test]
    fn test_final_price_monotone_in_tax_value() {
        for basis in [TaxBasis::OnNet, TaxBasis::OnGrossWithPrimary] {
            for kind in [TaxKind::Percentage, TaxKind::Fixed] {
                let mut previous = Decimal::MIN;
                for value in 0..=30 {
                    let set = [tax(kind, Decimal::from(value), basis)];
                    let taxes = resolve_line_taxes(dec!(1000), dec!(19), &set);
                    assert!(
                        taxes.unit_final_price >= previous,
                        "final price decreased for {:?}/{:?} at value {}",
                        kind,
                        basis,
                        value
                    );
                    previous = taxes.unit_final_price;
                }
            }
        }
    }

    #[test]
    fn test_source_prefers_structured_set() {
        let product = product_with(
            dec!(80),
            Some(definition("t1", TaxKind::Fixed, dec!(40), TaxBasis::OnNet)),
            vec![definition(
                "t2",
                TaxKind::Percentage,
                dec!(10),
                TaxBasis::OnNet,
            )],
        );
        let source = TaxSource::for_product(&product);
        assert!(matches!(source, TaxSource::Structured(_)));
        assert_eq!(source.taxes().len(), 1);
        assert_eq!(source.taxes()[0].value, dec!(10));
    }

    #[test]
    fn test_source_falls_back_to_primary_additional() {
        let product = product_with(
            dec!(80),
            Some(definition("t1", TaxKind::Fixed, dec!(40), TaxBasis::OnNet)),
            Vec::new(),
        );
        let source = TaxSource::for_product(&product);
        assert!(matches!(source, TaxSource::Primary(_)));
        assert_eq!(source.taxes()[0].value, dec!(40));
    }

    #[test]
    fn test_source_falls_back_to_legacy_fixed() {
        let product = product_with(dec!(80), None, Vec::new());
        let source = TaxSource::for_product(&product);
        assert!(matches!(source, TaxSource::LegacyFixed(_)));

        let applied = source.taxes()[0];
        assert_eq!(applied.kind, TaxKind::Fixed);
        assert_eq!(applied.basis, TaxBasis::OnNet);
        assert_eq!(applied.value, dec!(80));
    }

    #[test]
    fn test_source_none_when_nothing_configured() {
        let product = product_with(dec!(0), None, Vec::new());
        assert_eq!(TaxSource::for_product(&product), TaxSource::None);
        assert!(TaxSource::for_product(&product).taxes().is_empty());
    }

    #[test]
    fn test_untaxed_passthrough() {
        let taxes = LineTaxes::untaxed(dec!(750));
        assert_eq!(taxes.unit_final_price, dec!(750));
        assert_eq!(taxes.unit_primary_tax, dec!(0));
        assert_eq!(taxes.unit_additional_taxes(), dec!(0));
    }
}
