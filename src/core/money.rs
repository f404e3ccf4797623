//! Fixed-point currency amounts.
//!
//! Balances, rates, and charges are stored as whole minor units (paise). Decimal
//! input from JSON or TOML is rounded to the nearest minor unit exactly once, at
//! the boundary, so ledger arithmetic never accumulates floating point drift.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Number of minor units in one major currency unit.
pub const MINOR_PER_MAJOR: i64 = 100;

/// Largest decimal magnitude accepted from external input.
const MAX_DECIMAL: f64 = 1.0e13;

/// A signed currency amount in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero balance.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from minor units.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Creates an amount from whole major units.
    #[must_use]
    pub const fn from_major(major: i64) -> Self {
        Self(major * MINOR_PER_MAJOR)
    }

    /// Converts a decimal amount, rounding half away from zero to the nearest
    /// minor unit. Returns `None` for NaN, infinities, and absurd magnitudes.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_decimal(value: f64) -> Option<Self> {
        if !value.is_finite() || value.abs() > MAX_DECIMAL {
            return None;
        }
        Some(Self((value * 100.0).round() as i64))
    }

    /// Amount in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Amount as a decimal number of major units, for display and JSON.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// True when the amount is strictly greater than zero.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// True when the amount is below zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self {
        Self(self.0 * rhs)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_major = MINOR_PER_MAJOR.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / per_major, abs % per_major)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::from_decimal(value)
            .ok_or_else(|| de::Error::custom(format!("invalid currency amount: {value}")))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_from_decimal_rounds_to_nearest_minor_unit() {
        assert_eq!(Money::from_decimal(10.0), Some(Money::from_minor(1000)));
        assert_eq!(Money::from_decimal(0.125), Some(Money::from_minor(13)));
        assert_eq!(Money::from_decimal(-2.5), Some(Money::from_minor(-250)));
        assert_eq!(Money::from_decimal(0.001), Some(Money::ZERO));
    }

    #[test]
    fn test_from_decimal_rejects_non_finite() {
        assert_eq!(Money::from_decimal(f64::NAN), None);
        assert_eq!(Money::from_decimal(f64::INFINITY), None);
        assert_eq!(Money::from_decimal(f64::NEG_INFINITY), None);
        assert_eq!(Money::from_decimal(1.0e20), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_major(100).to_string(), "100.00");
        assert_eq!(Money::from_minor(1005).to_string(), "10.05");
        assert_eq!(Money::from_minor(-40).to_string(), "-0.40");
    }

    #[test]
    fn test_arithmetic() {
        let balance = Money::from_major(100);
        let rate = Money::from_major(10);
        assert_eq!(balance - rate * 8, Money::from_major(20));
        assert_eq!(-rate, Money::from_major(-10));
        assert!(Money::from_minor(1).is_positive());
        assert!(Money::from_minor(-1).is_negative());
        assert!(!Money::ZERO.is_positive());
    }

    #[test]
    fn test_serde_uses_decimal_major_units() {
        let json = serde_json::to_string(&Money::from_minor(1050)).unwrap();
        assert_eq!(json, "10.5");

        let parsed: Money = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, Money::from_major(42));

        let parsed: Money = serde_json::from_str("0.99").unwrap();
        assert_eq!(parsed, Money::from_minor(99));
    }
}
