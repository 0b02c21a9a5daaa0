//! Exact decimal money amounts.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A money amount backed by an exact decimal.
///
/// Serialized as a decimal string (`"24.48"`) so that no precision is lost on
/// the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a money amount from a decimal.
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates a money amount from minor units (e.g., 999 = 9.99).
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the underlying decimal.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is below zero.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiplies by a quantity; `None` on overflow.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(Decimal::from(quantity)).map(Money)
    }

    /// Adds two amounts; `None` on overflow.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Whether the amount fits a `NUMERIC(18,4)` column without rounding:
    /// at most four fractional digits and fourteen integer digits.
    pub fn is_storable(&self) -> bool {
        self.0.normalize().scale() <= MAX_SCALE && self.0.abs() < Decimal::from(STORABLE_LIMIT)
    }
}

/// Fractional digits kept by stored amounts.
pub const MAX_SCALE: u32 = 4;

/// Exclusive upper bound on the magnitude of stored amounts.
const STORABLE_LIMIT: i64 = 100_000_000_000_000;

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Money)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}
