//! # Validation Module
//!
//! Input validation for order and bill operations.
//!
//! Validation runs at the service boundary, before any business logic:
//! a table number out of range or a zero quantity should never reach the
//! stores. Everything here is a pure function returning a typed error.

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_ITEMS, MAX_TABLE_NUMBER};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a table number.
///
/// ## Rules
/// - Must be between 1 and [`MAX_TABLE_NUMBER`]
pub fn validate_table_number(table: u32) -> ValidationResult<()> {
    if table == 0 || table > MAX_TABLE_NUMBER {
        return Err(ValidationError::OutOfRange {
            field: "table".to_string(),
            min: 1,
            max: MAX_TABLE_NUMBER as i64,
        });
    }
    Ok(())
}

/// Validates a line item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_ITEM_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// Validates the number of distinct lines on an order.
pub fn validate_order_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_ORDER_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "order items".to_string(),
            min: 0,
            max: MAX_ORDER_ITEMS as i64,
        });
    }
    Ok(())
}

/// Validates a discount amount in cents.
///
/// Zero is allowed (clears a previous discount); negative is not.
pub fn validate_discount_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a customer label used in split plans.
///
/// Customers are identified by short labels ("anna", "seat 2") entered at
/// the table; these are not accounts, just split-share handles.
pub fn validate_customer_label(customer: &str) -> ValidationResult<()> {
    let customer = customer.trim();

    if customer.is_empty() {
        return Err(ValidationError::Required {
            field: "customer".to_string(),
        });
    }
    if customer.len() > 60 {
        return Err(ValidationError::TooLong {
            field: "customer".to_string(),
            max: 60,
        });
    }
    Ok(())
}

/// Validates free-text special instructions on a line item.
pub fn validate_instructions(text: &str) -> ValidationResult<()> {
    if text.len() > 280 {
        return Err(ValidationError::TooLong {
            field: "instructions".to_string(),
            max: 280,
        });
    }
    Ok(())
}

// =============================================================================
// Split Plan Validators
// =============================================================================

/// Validates a list of customer labels for an n-way split.
///
/// ## Rules
/// - At least one customer
/// - Each label valid per [`validate_customer_label`]
/// - No duplicates
pub fn validate_split_customers(customers: &[String]) -> ValidationResult<()> {
    if customers.is_empty() {
        return Err(ValidationError::Required {
            field: "customers".to_string(),
        });
    }
    for (idx, customer) in customers.iter().enumerate() {
        validate_customer_label(customer)?;
        if customers[..idx].iter().any(|c| c == customer) {
            return Err(ValidationError::DuplicateCustomer(customer.clone()));
        }
    }
    Ok(())
}

/// Validates percentage shares for a percentage split.
///
/// ## Rules
/// - Customers valid and unique
/// - Percentages (basis points) sum to exactly 10000 (100%)
pub fn validate_percentage_shares(shares: &[(String, u32)]) -> ValidationResult<()> {
    let customers: Vec<String> = shares.iter().map(|(c, _)| c.clone()).collect();
    validate_split_customers(&customers)?;

    let total_bps: u64 = shares.iter().map(|(_, bps)| *bps as u64).sum();
    if total_bps != 10_000 {
        return Err(ValidationError::InvalidFormat {
            field: "percentages".to_string(),
            reason: format!("must sum to 100%, got {}.{:02}%", total_bps / 100, total_bps % 100),
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
    fn test_validate_table_number() {
        assert!(validate_table_number(1).is_ok());
        assert!(validate_table_number(MAX_TABLE_NUMBER).is_ok());
        assert!(validate_table_number(0).is_err());
        assert!(validate_table_number(MAX_TABLE_NUMBER + 1).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_customer_label() {
        assert!(validate_customer_label("anna").is_ok());
        assert!(validate_customer_label("seat 2").is_ok());
        assert!(validate_customer_label("").is_err());
        assert!(validate_customer_label("   ").is_err());
        assert!(validate_customer_label(&"a".repeat(61)).is_err());
    }

    #[test]
    fn test_validate_split_customers() {
        let ok = vec!["anna".to_string(), "ben".to_string()];
        assert!(validate_split_customers(&ok).is_ok());

        assert!(validate_split_customers(&[]).is_err());

        let dup = vec!["anna".to_string(), "anna".to_string()];
        assert!(matches!(
            validate_split_customers(&dup),
            Err(ValidationError::DuplicateCustomer(_))
        ));
    }

    #[test]
    fn test_validate_percentage_shares() {
        let ok = vec![("anna".to_string(), 6000), ("ben".to_string(), 4000)];
        assert!(validate_percentage_shares(&ok).is_ok());

        let short = vec![("anna".to_string(), 6000), ("ben".to_string(), 3000)];
        assert!(validate_percentage_shares(&short).is_err());
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount_cents(0).is_ok());
        assert!(validate_discount_cents(500).is_ok());
        assert!(validate_discount_cents(-1).is_err());
    }
}
