//! Money Conversion Module
//!
//! The records store keeps dollar amounts with cent precision; the transfer API
//! only accepts a non-negative integer number of cents. All conversions between
//! the two go through this module.
//!
//! ## Rules
//! - Cents are `round(abs(dollars) * 100)`, midpoint away from zero
//! - Direction never travels in the sign of a cent amount
//! - Operator-entered amounts must be strictly positive and at least one cent

use rust_decimal::prelude::*;
use serde::Serializer;

use crate::error::DisbursementError;

/// Convert a signed dollar amount to an unsigned cent amount
pub fn to_cents(dollars: Decimal) -> Result<u64, DisbursementError> {
    let too_large =
        || DisbursementError::InvalidInput(format!("amount {} does not fit in cents", dollars));
    let cents = dollars
        .abs()
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(too_large)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    cents.to_u64().ok_or_else(too_large)
}

/// Render a dollar amount with exactly two decimals (`5` -> `5.00`)
pub fn format_dollars(dollars: Decimal) -> String {
    let rounded = dollars.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

/// Serde helper: dollars as a two-decimal string (`"2.00"`)
pub fn serialize_dollars<S>(dollars: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_dollars(*dollars))
}

/// Parse an operator-supplied custom amount
///
/// Accepts `"25"`, `"25.5"`, `" 10.00 "`. Rejects empty, non-numeric,
/// zero, negative, and amounts that round to zero cents.
pub fn parse_custom_amount(raw: &str) -> Result<Decimal, DisbursementError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DisbursementError::InvalidInput(
            "custom amount is required".into(),
        ));
    }

    let amount = Decimal::from_str(raw).map_err(|_| {
        DisbursementError::InvalidInput(format!("custom amount '{}' is not a number", raw))
    })?;

    validate_custom_amount(amount)?;
    Ok(amount)
}

/// Positive and at least one cent once rounded
pub fn validate_custom_amount(amount: Decimal) -> Result<(), DisbursementError> {
    if amount <= Decimal::ZERO {
        return Err(DisbursementError::InvalidInput(format!(
            "custom amount must be greater than zero, got {}",
            amount
        )));
    }
    if to_cents(amount)? == 0 {
        return Err(DisbursementError::InvalidInput(format!(
            "custom amount {} is smaller than one cent",
            amount
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_to_cents_uses_absolute_value() {
        assert_eq!(to_cents(dec("5.00")).unwrap(), 500);
        assert_eq!(to_cents(dec("-3.00")).unwrap(), 300);
        assert_eq!(to_cents(dec("0")).unwrap(), 0);
    }

    #[test]
    fn test_to_cents_rounds_instead_of_truncating() {
        // 19.99 * 100 as f64 is 1998.9999..., truncation would give 1998
        assert_eq!(to_cents(dec("19.99")).unwrap(), 1999);
        assert_eq!(to_cents(dec("0.005")).unwrap(), 1);
        assert_eq!(to_cents(dec("-0.005")).unwrap(), 1);
        assert_eq!(to_cents(dec("1.004")).unwrap(), 100);
    }

    #[test]
    fn test_to_cents_overflow_is_invalid_input() {
        for raw in ["1000000000000000000000000000", "-79228162514264337593543950335"] {
            let err = to_cents(dec(raw)).unwrap_err();
            assert!(matches!(err, DisbursementError::InvalidInput(_)), "{}", raw);
        }
        // Fits in Decimal once multiplied, but not in u64
        assert!(to_cents(dec("1000000000000000000")).is_err());
    }

    #[test]
    fn test_parse_custom_amount_rejects_huge_amount() {
        let err = parse_custom_amount("1000000000000000000000000000").unwrap_err();
        assert!(matches!(err, DisbursementError::InvalidInput(_)));
    }

    #[test]
    fn test_to_cents_from_float_amount() {
        let from_float = Decimal::from_f64(0.29).unwrap();
        assert_eq!(to_cents(from_float).unwrap(), 29);
    }

    #[test]
    fn test_format_dollars() {
        assert_eq!(format_dollars(dec("5")), "5.00");
        assert_eq!(format_dollars(dec("2.5")), "2.50");
        assert_eq!(format_dollars(dec("-3")), "-3.00");
        assert_eq!(format_dollars(dec("1.005")), "1.01");
    }

    #[test]
    fn test_parse_custom_amount_accepts_positive() {
        assert_eq!(parse_custom_amount("25").unwrap(), dec("25"));
        assert_eq!(parse_custom_amount(" 10.50 ").unwrap(), dec("10.50"));
    }

    #[test]
    fn test_parse_custom_amount_rejects_bad_input() {
        for raw in ["", "   ", "abc", "-1", "0", "0.00", "0.001", "1e"] {
            let err = parse_custom_amount(raw).unwrap_err();
            assert!(
                matches!(err, DisbursementError::InvalidInput(_)),
                "expected InvalidInput for {:?}",
                raw
            );
        }
    }
}
