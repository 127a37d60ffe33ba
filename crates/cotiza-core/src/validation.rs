//! # Validation Module
//!
//! Business rule validation for Cotiza.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (API / UI)                                            │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (sku, sequence numbers)                        │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{ValidationError, ValidationResult};
use crate::{MAX_LINE_QUANTITY, MAX_QUOTE_LINES};

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (company, product, client, worker).
///
/// ## Rules
/// - Must not be empty after trimming
/// - Maximum 255 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 255 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 255,
        });
    }

    Ok(())
}

/// Validates an email address, when present.
///
/// Intentionally shallow: the SMTP collaborator performs the authoritative
/// parse. This catches obviously broken input before it is persisted.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();

    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "expected local@domain.tld".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item quantity.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a discount percent (0-100, inclusive).
pub fn validate_discount_percent(discount: Decimal) -> ValidationResult<()> {
    if discount < Decimal::ZERO || discount > dec!(100) {
        return Err(ValidationError::InvalidPercentage {
            field: "discount_percent".to_string(),
        });
    }
    Ok(())
}

/// Validates a non-negative monetary amount (prices, fixed taxes).
pub fn validate_amount(field: &str, amount: Decimal) -> ValidationResult<()> {
    if amount < Decimal::ZERO {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a quote's number of line items.
pub fn validate_line_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "line items".to_string(),
        });
    }
    if count > MAX_QUOTE_LINES {
        return Err(ValidationError::TooMany {
            field: "line items".to_string(),
            max: MAX_QUOTE_LINES,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("nombre", "Comercial Andes SpA").is_ok());
        assert!(validate_name("nombre", "   ").is_err());
        assert!(validate_name("nombre", &"x".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("cliente@empresa.cl").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("sin-arroba.cl").is_err());
        assert!(validate_email("nombre@sintld").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-2).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_discount_percent() {
        assert!(validate_discount_percent(dec!(0)).is_ok());
        assert!(validate_discount_percent(dec!(100)).is_ok());
        assert!(validate_discount_percent(dec!(12.5)).is_ok());
        assert!(validate_discount_percent(dec!(-1)).is_err());
        assert!(validate_discount_percent(dec!(100.01)).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("precio", dec!(0)).is_ok());
        assert!(validate_amount("precio", dec!(990.5)).is_ok());
        assert!(validate_amount("precio", dec!(-10)).is_err());
    }

    #[test]
    fn test_validate_line_count() {
        assert!(validate_line_count(1).is_ok());
        assert!(validate_line_count(MAX_QUOTE_LINES).is_ok());
        assert!(validate_line_count(0).is_err());
        assert!(validate_line_count(MAX_QUOTE_LINES + 1).is_err());
    }
}
