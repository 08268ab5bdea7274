//! Validation utilities for the Farm Nursery Management Platform

use rust_decimal::Decimal;

// ============================================================================
// Booking Validations
// ============================================================================

/// Validate a variety-line quantity. Zero is allowed (the line still counts
/// toward the schedule with a 0 contribution); negative is not.
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity < Decimal::ZERO {
        return Err("Quantity cannot be negative");
    }
    Ok(())
}

/// Validate a per-unit rate
pub fn validate_rate(rate: Decimal) -> Result<(), &'static str> {
    if rate < Decimal::ZERO {
        return Err("Rate per unit cannot be negative");
    }
    Ok(())
}

/// Validate a variety display name
pub fn validate_variety_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Variety name cannot be empty");
    }
    Ok(())
}

/// Validate a crop group display name
pub fn validate_group_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Crop group name cannot be empty");
    }
    Ok(())
}

// ============================================================================
// Schedule Validations
// ============================================================================

/// Validate a completed progress counter. It is an absolute value, never a
/// delta, and is deliberately not clamped to the variety total.
pub fn validate_completed(completed: Decimal) -> Result<(), &'static str> {
    if completed < Decimal::ZERO {
        return Err("Completed count cannot be negative");
    }
    Ok(())
}

// ============================================================================
// Farmer Validations
// ============================================================================

/// Validate a farmer registration code (uppercase alphanumeric plus dashes,
/// 3 to 20 characters)
pub fn validate_registration_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 3 || code.len() > 20 {
        return Err("Registration code must be 3-20 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Registration code must be uppercase alphanumeric with dashes");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_quantity_is_valid() {
        assert!(validate_quantity(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_negative_quantity_rejected() {
        assert!(validate_quantity(Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_negative_rate_rejected() {
        assert!(validate_rate(Decimal::new(-25, 1)).is_err());
        assert!(validate_rate(Decimal::new(25, 1)).is_ok());
    }

    #[test]
    fn test_blank_variety_name_rejected() {
        assert!(validate_variety_name("   ").is_err());
        assert!(validate_variety_name("Tomato Hybrid").is_ok());
    }

    #[test]
    fn test_completed_not_clamped_to_total() {
        // Over-completion is a known, tolerated state
        assert!(validate_completed(Decimal::from(1000)).is_ok());
        assert!(validate_completed(Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_registration_code_format() {
        assert!(validate_registration_code("FRM-0042").is_ok());
        assert!(validate_registration_code("ab").is_err());
        assert!(validate_registration_code("frm-0042").is_err());
    }
}
