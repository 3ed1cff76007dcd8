//! Validation utilities for the grocery order-fulfillment engine
//!
//! Includes India-specific checks (PIN codes, mobile numbers) used when
//! snapshotting customer addresses onto orders.

use rust_decimal::Decimal;

// ============================================================================
// Order Input Validations
// ============================================================================

/// Validate a line-item quantity
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a unit price
pub fn validate_unit_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Unit price cannot be negative");
    }
    Ok(())
}

/// Validate a charge (delivery or handling)
pub fn validate_charge(charge: Decimal) -> Result<(), &'static str> {
    if charge < Decimal::ZERO {
        return Err("Charge cannot be negative");
    }
    Ok(())
}

/// Validate a discount amount against the items subtotal
pub fn validate_discount(amount: Decimal, items_subtotal: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Discount cannot be negative");
    }
    if amount > items_subtotal {
        return Err("Discount cannot exceed the items subtotal");
    }
    Ok(())
}

/// Validate a sequential order number: ORD followed by at least five digits
pub fn validate_order_number(order_number: &str) -> Result<(), &'static str> {
    let Some(digits) = order_number.strip_prefix("ORD") else {
        return Err("Order number must start with 'ORD'");
    };
    if digits.len() < 5 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err("Order number must be ORD followed by at least five digits");
    }
    Ok(())
}

/// Validate a cancellation reason (optional, but bounded when present)
pub fn validate_cancellation_reason(reason: &str) -> Result<(), &'static str> {
    if reason.len() > 500 {
        return Err("Cancellation reason must be at most 500 characters");
    }
    Ok(())
}

/// Upper bound on the slot availability window, in days
pub const MAX_SLOT_WINDOW_DAYS: u32 = 14;

/// Validate the requested slot availability window. The calculator builds
/// one day entry per requested day, so the window must stay small.
pub fn validate_slot_window(days: u32) -> Result<(), &'static str> {
    if days == 0 {
        return Err("Day window must be at least 1");
    }
    if days > MAX_SLOT_WINDOW_DAYS {
        return Err("Day window cannot exceed 14 days");
    }
    Ok(())
}

// ============================================================================
// India-Specific Validations
// ============================================================================

/// Validate an Indian PIN code: 6 digits, first digit 1-9
pub fn validate_pin_code(pin_code: &str) -> Result<(), &'static str> {
    if pin_code.len() != 6 || !pin_code.chars().all(|c| c.is_ascii_digit()) {
        return Err("PIN code must be 6 digits");
    }
    if pin_code.starts_with('0') {
        return Err("PIN code cannot start with 0");
    }
    Ok(())
}

/// Validate an Indian mobile number
/// Accepts: 9876543210, +919876543210, 919876543210
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    // Domestic: 10 digits starting 6-9
    if digits.len() == 10 && matches!(digits.as_bytes()[0], b'6'..=b'9') {
        return Ok(());
    }
    // With country code: 12 digits starting 91
    if digits.len() == 12 && digits.starts_with("91") && matches!(digits.as_bytes()[2], b'6'..=b'9')
    {
        return Ok(());
    }

    Err("Invalid Indian mobile number")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(99).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn test_validate_unit_price() {
        assert!(validate_unit_price(Decimal::ZERO).is_ok());
        assert!(validate_unit_price(Decimal::from(45)).is_ok());
        assert!(validate_unit_price(Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_validate_charge() {
        assert!(validate_charge(Decimal::from(20)).is_ok());
        assert!(validate_charge(Decimal::from(-5)).is_err());
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(Decimal::from(10), Decimal::from(100)).is_ok());
        assert!(validate_discount(Decimal::from(100), Decimal::from(100)).is_ok());
        assert!(validate_discount(Decimal::from(101), Decimal::from(100)).is_err());
        assert!(validate_discount(Decimal::from(-1), Decimal::from(100)).is_err());
    }

    #[test]
    fn test_validate_order_number() {
        assert!(validate_order_number("ORD00001").is_ok());
        assert!(validate_order_number("ORD123456").is_ok());
        assert!(validate_order_number("ORD1").is_err());
        assert!(validate_order_number("XYZ00001").is_err());
        assert!(validate_order_number("ORD0000A").is_err());
    }

    #[test]
    fn test_validate_cancellation_reason() {
        assert!(validate_cancellation_reason("Out of stock").is_ok());
        assert!(validate_cancellation_reason(&"x".repeat(501)).is_err());
    }

    #[test]
    fn test_validate_slot_window() {
        assert!(validate_slot_window(1).is_ok());
        assert!(validate_slot_window(MAX_SLOT_WINDOW_DAYS).is_ok());
        assert!(validate_slot_window(0).is_err());
        assert!(validate_slot_window(MAX_SLOT_WINDOW_DAYS + 1).is_err());
        assert!(validate_slot_window(200_000_000).is_err());
    }

    #[test]
    fn test_validate_pin_code() {
        assert!(validate_pin_code("395003").is_ok());
        assert!(validate_pin_code("110001").is_ok());
        assert!(validate_pin_code("095003").is_err()); // Leading zero
        assert!(validate_pin_code("39500").is_err()); // Too short
        assert!(validate_pin_code("39500a").is_err()); // Non-digit
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("+91 98765 43210").is_ok());
        assert!(validate_phone("919876543210").is_ok());
        assert!(validate_phone("1234567890").is_err()); // Starts with 1
        assert!(validate_phone("98765").is_err());
    }
}
