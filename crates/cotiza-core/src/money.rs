//! # Money Formatting
//!
//! Display helpers for monetary amounts and percentages.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Quote totals accumulate per-unit tax amounts across many lines and     │
//! │  quantities; binary floats drift and the drift is visible on invoices.  │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal::Decimal                                    │
//! │    Exact base-10 arithmetic. Prices carry four decimal places in        │
//! │    storage; rounding happens ONLY at display time, per company          │
//! │    currency settings.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Display Convention
//! Amounts render Chilean-style: `$ 1.234.567` (thousands separator `.`,
//! decimal separator `,`, symbol and decimal places from the company's
//! [`CurrencySettings`]).

use rust_decimal::Decimal;

use crate::types::CurrencySettings;

/// Formats a monetary amount using a company's currency settings.
///
/// ## Example
/// ```rust
/// use cotiza_core::money::format_amount;
/// use cotiza_core::types::CurrencySettings;
/// use rust_decimal_macros::dec;
///
/// let clp = CurrencySettings::default(); // $, 0 decimals
/// assert_eq!(format_amount(dec!(1234567), &clp), "$ 1.234.567");
/// ```
pub fn format_amount(value: Decimal, currency: &CurrencySettings) -> String {
    let rounded = value.round_dp(currency.decimals);
    let negative = rounded.is_sign_negative();
    let digits = format!("{:.*}", currency.decimals as usize, rounded.abs());

    // Split integer and fractional parts produced by Display
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits.as_str(), None),
    };

    let grouped = group_thousands(int_part);

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&currency.symbol);
    out.push(' ');
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}

/// Formats a percentage: integer when the decimal part is zero, otherwise
/// one decimal digit. No trailing `%` sign.
///
/// ## Example
/// ```rust
/// use cotiza_core::money::format_percent;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_percent(dec!(5.0)), "5");
/// assert_eq!(format_percent(dec!(7.5)), "7.5");
/// ```
pub fn format_percent(value: Decimal) -> String {
    let normalized = value.normalize();
    if normalized.scale() == 0 {
        normalized.to_string()
    } else {
        format!("{:.1}", value)
    }
}

/// Inserts `.` thousands separators into a digit string.
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    let chars: Vec<char> = digits.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }
    grouped
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn clp() -> CurrencySettings {
        CurrencySettings::default()
    }

    #[test]
    fn test_format_amount_clp() {
        assert_eq!(format_amount(dec!(0), &clp()), "$ 0");
        assert_eq!(format_amount(dec!(950), &clp()), "$ 950");
        assert_eq!(format_amount(dec!(1234), &clp()), "$ 1.234");
        assert_eq!(format_amount(dec!(1234567), &clp()), "$ 1.234.567");
    }

    #[test]
    fn test_format_amount_rounds_to_currency_decimals() {
        // CLP shows no decimals: 1189.6 rounds up
        assert_eq!(format_amount(dec!(1189.6), &clp()), "$ 1.190");
    }

    #[test]
    fn test_format_amount_with_decimals() {
        let usd = CurrencySettings {
            symbol: "US$".to_string(),
            code: "USD".to_string(),
            decimals: 2,
        };
        assert_eq!(format_amount(dec!(1249.5), &usd), "US$ 1.249,50");
    }

    #[test]
    fn test_format_amount_negative() {
        assert_eq!(format_amount(dec!(-4500), &clp()), "-$ 4.500");
    }

    #[test]
    fn test_format_percent_integer_when_whole() {
        assert_eq!(format_percent(dec!(5)), "5");
        assert_eq!(format_percent(dec!(5.00)), "5");
        assert_eq!(format_percent(dec!(19.0)), "19");
    }

    #[test]
    fn test_format_percent_one_decimal_otherwise() {
        assert_eq!(format_percent(dec!(7.5)), "7.5");
        assert_eq!(format_percent(dec!(12.50)), "12.5");
    }
}
