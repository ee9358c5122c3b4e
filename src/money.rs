//! Money Conversion Module
//!
//! Conversion between the ledger's internal integer representation and the
//! human-entered / human-displayed decimal strings. All conversions MUST go
//! through this module.
//!
//! ## Design Principles
//! 1. Explicit Error Handling: No silent truncation or rounding
//! 2. Strict grammar: `digits` or `digits.digits`, nothing else
//! 3. Zero is never a valid tip amount
//!
//! ## Internal Representation
//! - All amounts are [`Amount`] (`u128`) in the smallest ledger unit
//! - The scale factor is `10^decimals` (18 for the tip token, like wei)
//!
//! ## Usage
//! ```rust
//! use tipbot::money::{format_amount, parse_amount};
//!
//! // User tips "3" tokens, integers only
//! let internal = parse_amount("3", 18, 0).unwrap();
//! assert_eq!(internal, 3_000_000_000_000_000_000);
//!
//! // Display a balance
//! assert_eq!(format_amount(1_500_000_000_000_000_000, 18), "1.5");
//! ```

use thiserror::Error;

use crate::core_types::Amount;

// ============================================================================
// Error Types
// ============================================================================

/// Money conversion errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Amount too large, would overflow")]
    Overflow,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

// ============================================================================
// Parse: Client → Internal (String → Amount)
// ============================================================================

/// Convert a human-entered amount string to the internal representation
///
/// # Arguments
/// * `amount_str` - Client-provided amount string (e.g., "3", "1.5")
/// * `decimals` - Token's on-chain decimal places (scale)
/// * `max_fraction_digits` - How many fractional digits callers may enter.
///   `0` means integers only: any fractional separator is rejected.
///
/// # Errors
/// * `PrecisionOverflow` - More fractional digits than allowed
/// * `InvalidAmount` - Amount is zero or carries a sign
/// * `Overflow` - Result would overflow `u128`
/// * `InvalidFormat` - Anything outside the strict grammar
pub fn parse_amount(
    amount_str: &str,
    decimals: u32,
    max_fraction_digits: u32,
) -> Result<Amount, MoneyError> {
    let amount_str = amount_str.trim();
    if amount_str.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }

    if amount_str.starts_with('-') || amount_str.starts_with('+') {
        return Err(MoneyError::InvalidAmount);
    }

    let allowed = max_fraction_digits.min(decimals);

    let parts: Vec<&str> = amount_str.split('.').collect();
    let (whole, frac) = match parts.len() {
        1 => (parts[0], ""),
        2 => {
            // Both sides of the dot must be non-empty: ".5" and "5." are ambiguous
            if parts[0].is_empty() {
                return Err(MoneyError::InvalidFormat(
                    "missing leading zero (e.g., use 0.5 instead of .5)".into(),
                ));
            }
            if parts[1].is_empty() {
                return Err(MoneyError::InvalidFormat(
                    "missing fractional part (e.g., use 5.0 instead of 5.)".into(),
                ));
            }
            (parts[0], parts[1])
        }
        _ => return Err(MoneyError::InvalidFormat("multiple decimal points".into())),
    };

    if !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MoneyError::InvalidFormat(format!(
            "invalid character in whole part: {}",
            whole
        )));
    }
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MoneyError::InvalidFormat(format!(
            "invalid character in fractional part: {}",
            frac
        )));
    }

    // REJECT if too many decimals (no silent truncation!)
    if frac.len() > allowed as usize {
        return Err(MoneyError::PrecisionOverflow {
            provided: frac.len() as u32,
            max: allowed,
        });
    }

    let whole_num: Amount = whole.parse::<Amount>().map_err(|_| MoneyError::Overflow)?;

    let frac_num: Amount = if frac.is_empty() {
        0
    } else {
        let frac_padded = format!("{:0<width$}", frac, width = decimals as usize);
        frac_padded
            .parse::<Amount>()
            .map_err(|_| MoneyError::InvalidFormat("invalid fractional part".into()))?
    };

    let multiplier = scale(decimals)?;
    let amount = whole_num
        .checked_mul(multiplier)
        .and_then(|v| v.checked_add(frac_num))
        .ok_or(MoneyError::Overflow)?;

    if amount == 0 {
        return Err(MoneyError::InvalidAmount);
    }

    Ok(amount)
}

fn scale(decimals: u32) -> Result<Amount, MoneyError> {
    10u128.checked_pow(decimals).ok_or(MoneyError::Overflow)
}

// ============================================================================
// Format: Internal → Client (Amount → String)
// ============================================================================

/// Convert an internal amount to a display string with full precision
///
/// Trailing fractional zeros are trimmed, and the dot is dropped for whole
/// amounts: `3_000..0` (18 dp) renders as `"3"`, `1_500..0` as `"1.5"`.
pub fn format_amount(value: Amount, decimals: u32) -> String {
    let Ok(unit) = scale(decimals) else {
        return value.to_string();
    };
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let frac_str = format!("{:0>width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac_str.trim_end_matches('0'))
}

/// Convert an internal amount to a display string, truncated (never rounded)
/// to at most `display_decimals` fractional digits
pub fn format_amount_truncated(value: Amount, decimals: u32, display_decimals: u32) -> String {
    if display_decimals >= decimals {
        return format_amount(value, decimals);
    }
    let Ok(step) = scale(decimals - display_decimals) else {
        return format_amount(value, decimals);
    };
    format_amount(value - value % step, decimals)
}

// ============================================================================
// Unit Tests
// ============================================================================
