//! Exact decimal amounts
//!
//! Every amount and balance in the ledger is a [`Money`] value. It wraps
//! `rust_decimal::Decimal`, so arithmetic is exact and the textual form
//! survives a parse/print cycle unchanged (`"100.0050"` stays `"100.0050"`).
//! Binary floating point is never used for amounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;
use thiserror::Error;

/// Maximum fractional digits for amounts and balances (`numeric(20,4)`).
pub const MONEY_SCALE: u32 = 4;

/// Maximum integer digits for amounts and balances (`numeric(20,4)`).
pub const MONEY_INTEGER_DIGITS: u32 = 16;

/// Maximum fractional digits for exchange rates (`numeric(10,6)`).
pub const RATE_SCALE: u32 = 6;

/// Maximum integer digits for exchange rates (`numeric(10,6)`).
pub const RATE_INTEGER_DIGITS: u32 = 4;

/// Errors raised while parsing or combining amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// Input is not a decimal number
    #[error("invalid amount format: {0}")]
    Malformed(String),

    /// Input carries more fractional digits than the column can hold
    #[error("amount {input} exceeds {max_scale} fractional digits")]
    ScaleExceeded {
        /// Offending input
        input: String,
        /// Allowed scale
        max_scale: u32,
    },

    /// Input carries more integer digits than the column can hold
    #[error("amount {input} exceeds {max_integer_digits} integer digits")]
    PrecisionExceeded {
        /// Offending input
        input: String,
        /// Allowed integer digits
        max_integer_digits: u32,
    },

    /// Arithmetic left the representable range
    #[error("amount out of range")]
    Overflow,

    /// Exchange rates must be strictly positive
    #[error("exchange rate must be positive: {0}")]
    NonPositiveRate(String),
}

fn parse_decimal(
    input: &str,
    max_integer_digits: u32,
    max_scale: u32,
) -> Result<Decimal, MoneyError> {
    let value =
        Decimal::from_str(input).map_err(|_| MoneyError::Malformed(input.to_string()))?;

    if value.scale() > max_scale {
        return Err(MoneyError::ScaleExceeded {
            input: input.to_string(),
            max_scale,
        });
    }

    let limit = Decimal::from(10_i64.pow(max_integer_digits));
    if value.abs() >= limit {
        return Err(MoneyError::PrecisionExceeded {
            input: input.to_string(),
            max_integer_digits,
        });
    }

    Ok(value)
}

/// Exact monetary amount
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero amount
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Parse a decimal string such as `"50.00"`.
    ///
    /// The sign is preserved; callers decide whether negative values are acceptable.
    pub fn parse(input: &str) -> Result<Self, MoneyError> {
        parse_decimal(input, MONEY_INTEGER_DIGITS, MONEY_SCALE).map(Self)
    }

    /// Wrap an existing decimal
    pub fn from_decimal(value: Decimal) -> Self {
        Self(value)
    }

    /// Underlying decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Add two amounts, `None` on overflow
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Multiply by a small integer multiplier (sign flips, fees, splits)
    pub fn times(self, multiplier: i64) -> Option<Money> {
        self.0.checked_mul(Decimal::from(multiplier)).map(Money)
    }

    /// Strictly greater than zero
    pub fn is_positive(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_positive()
    }

    /// Strictly less than zero
    pub fn is_negative(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_negative()
    }

    /// Equal to zero, regardless of scale
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Conversion rate carried by a posting (defaults to 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeRate(Decimal);

impl ExchangeRate {
    /// Identity rate
    pub const ONE: ExchangeRate = ExchangeRate(Decimal::ONE);

    /// Parse a strictly positive rate with at most four integer and six fractional digits
    pub fn parse(input: &str) -> Result<Self, MoneyError> {
        let value = parse_decimal(input, RATE_INTEGER_DIGITS, RATE_SCALE)?;
        if value.is_zero() || value.is_sign_negative() {
            return Err(MoneyError::NonPositiveRate(input.to_string()));
        }
        Ok(Self(value))
    }

    /// Wrap an existing decimal (used by storage adapters)
    pub fn from_decimal(value: Decimal) -> Self {
        Self(value)
    }

    /// Underlying decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl Default for ExchangeRate {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
