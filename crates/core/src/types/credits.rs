//! Credit amounts, the armory's only currency.
//!
//! Prices, balances, and order totals are whole credits. Arithmetic is
//! saturating so a malicious catalog entry cannot panic the client.

use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

/// A whole-credit amount (price, balance, or order total).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Credits(i64);

impl Credits {
    /// Zero credits.
    pub const ZERO: Self = Self(0);

    /// Create an amount from a whole number of credits.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Get the underlying amount.
    #[must_use]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Multiply a unit price by a line quantity.
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as i64))
    }

    /// True for amounts greater than zero.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Add for Credits {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Credits {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Credits {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Credits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl std::fmt::Display for Credits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} CR", self.0)
    }
}

impl From<i64> for Credits {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl From<Credits> for i64 {
    fn from(credits: Credits) -> Self {
        credits.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_subtotal() {
        let price = Credits::new(100);
        assert_eq!(price.times(3), Credits::new(300));
    }

    #[test]
    fn test_sum_of_lines() {
        let total: Credits = [Credits::new(200), Credits::new(50)].into_iter().sum();
        assert_eq!(total, Credits::new(250));
    }

    #[test]
    fn test_saturating_multiply() {
        let price = Credits::new(i64::MAX);
        assert_eq!(price.times(2), Credits::new(i64::MAX));
    }

    #[test]
    fn test_display() {
        assert_eq!(Credits::new(1500).to_string(), "1500 CR");
    }

    #[test]
    fn test_is_positive() {
        assert!(Credits::new(1).is_positive());
        assert!(!Credits::ZERO.is_positive());
        assert!(!Credits::new(-5).is_positive());
    }
}
