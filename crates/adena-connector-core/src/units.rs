use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{BASE_DENOM, BASE_UNITS_PER_DISPLAY};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitError {
    #[error("amount is empty")]
    Empty,
    #[error("amount is not a decimal number: {0}")]
    Malformed(String),
    #[error("amount must not be negative: {0}")]
    Negative(String),
    #[error("amount overflows base units: {0}")]
    Overflow(String),
}

/// Fraction digits of a display amount that can still reach a whole base unit.
const DISPLAY_DECIMALS: i64 = 6;

/// Display amount to base units. Fractions below one base unit are truncated.
pub fn to_base_units(amount: &str) -> Result<String, UnitError> {
    let raw = amount.trim();
    if raw.is_empty() {
        return Err(UnitError::Empty);
    }
    let value = parse_decimal(raw)?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(UnitError::Negative(raw.to_owned()));
    }
    // parsing more than 28 fraction digits rounds, so cut them before scaling
    let value = parse_decimal(&truncate_excess_fraction(raw))?;
    let scaled = value
        .checked_mul(Decimal::from(BASE_UNITS_PER_DISPLAY))
        .ok_or_else(|| UnitError::Overflow(raw.to_owned()))?;
    scaled
        .floor()
        .to_u64()
        .map(|units| units.to_string())
        .ok_or_else(|| UnitError::Overflow(raw.to_owned()))
}

fn parse_decimal(raw: &str) -> Result<Decimal, UnitError> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| UnitError::Malformed(raw.to_owned()))
}

/// Drops mantissa fraction digits worth less than one base unit.
fn truncate_excess_fraction(raw: &str) -> String {
    let (mantissa, exponent) = match raw.find(['e', 'E']) {
        Some(at) => raw.split_at(at),
        None => (raw, ""),
    };
    let shift = exponent
        .get(1..)
        .and_then(|e| e.parse::<i64>().ok())
        .unwrap_or(0);
    let keep = usize::try_from(DISPLAY_DECIMALS.saturating_add(shift)).unwrap_or(0);
    match mantissa.split_once('.') {
        Some((whole, fraction))
            if fraction.len() > keep && fraction.bytes().all(|b| b.is_ascii_digit()) =>
        {
            format!("{whole}.{}0{exponent}", &fraction[..keep])
        }
        _ => raw.to_owned(),
    }
}

/// Provider coin string (`"1234ugnot"`) to a bare base-unit amount.
pub fn strip_denom(coins: &str) -> Option<String> {
    let trimmed = coins.trim();
    let digits = trimmed.strip_suffix(BASE_DENOM).unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits.to_owned())
}
