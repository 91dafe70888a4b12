//! Base-unit to decimal conversion.
//!
//! Every asset counts amounts in an integer base unit (satoshi, zatoshi,
//! wei...). Display amounts are the base amount divided by `10^decimals`.
//! Conversion uses `rust_decimal` throughout so no binary floating point
//! rounding can creep in.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest number of decimal places a [`CoinRate`] accepts.
///
/// `10^18` still fits in an `i64` base amount multiplier and covers every
/// EVM token.
pub const MAX_DECIMALS: u32 = 18;

/// Errors produced by amount conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// The base-unit value does not fit in an `i64`.
    #[error("amount overflows the base unit range")]
    Overflow,

    /// A negative decimal amount was given where only positive ones make sense.
    #[error("amount must not be negative")]
    Negative,

    /// The scale is larger than [`MAX_DECIMALS`].
    #[error("unsupported number of decimals: {0}")]
    UnsupportedDecimals(u32),
}

/// Fixed power-of-ten scale between base units and display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct CoinRate {
    decimals: u32,
}

impl CoinRate {
    /// Create a rate of `10^decimals` base units per display unit.
    pub fn new(decimals: u32) -> Result<Self, AmountError> {
        if decimals > MAX_DECIMALS {
            return Err(AmountError::UnsupportedDecimals(decimals));
        }
        Ok(Self { decimals })
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// `10^decimals` as a decimal.
    pub fn scale(&self) -> Decimal {
        Decimal::from(10u64.pow(self.decimals))
    }

    /// Convert a base-unit amount to display units. Exact.
    pub fn to_decimal(&self, base_units: i64) -> Decimal {
        Decimal::new(base_units, self.decimals).normalize()
    }

    /// Convert a display amount to base units.
    ///
    /// Digits below the base unit are truncated toward zero, never rounded:
    /// `1.500000005` at 8 decimals yields `150_000_000`.
    pub fn to_base_units(&self, amount: Decimal) -> Result<i64, AmountError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(AmountError::Negative);
        }
        amount
            .checked_mul(self.scale())
            .ok_or(AmountError::Overflow)?
            .trunc()
            .to_i64()
            .ok_or(AmountError::Overflow)
    }
}

impl TryFrom<u32> for CoinRate {
    type Error = AmountError;

    fn try_from(decimals: u32) -> Result<Self, Self::Error> {
        Self::new(decimals)
    }
}

impl From<CoinRate> for u32 {
    fn from(rate: CoinRate) -> Self {
        rate.decimals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_to_decimal_is_exact() {
        let rate = CoinRate::new(8).unwrap();
        assert_eq!(rate.to_decimal(150_000_000), dec("1.5"));
        assert_eq!(rate.to_decimal(1), dec("0.00000001"));
        assert_eq!(rate.to_decimal(0), Decimal::ZERO);
        assert_eq!(rate.to_decimal(-50_000_000), dec("-0.5"));
    }

    #[test]
    fn test_to_base_units_truncates() {
        let rate = CoinRate::new(8).unwrap();
        assert_eq!(rate.to_base_units(dec("1.5")).unwrap(), 150_000_000);
        assert_eq!(rate.to_base_units(dec("1.500000005")).unwrap(), 150_000_000);
        assert_eq!(rate.to_base_units(dec("1.500000009")).unwrap(), 150_000_000);
        assert_eq!(rate.to_base_units(dec("0.000000009")).unwrap(), 0);
    }

    #[test]
    fn test_to_base_units_rejects_bad_input() {
        let rate = CoinRate::new(18).unwrap();
        assert_eq!(rate.to_base_units(dec("-1")), Err(AmountError::Negative));
        assert_eq!(rate.to_base_units(dec("100")), Err(AmountError::Overflow));
        assert_eq!(
            CoinRate::new(19),
            Err(AmountError::UnsupportedDecimals(19))
        );
    }
}
