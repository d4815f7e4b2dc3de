//! Money value object.

use serde::{Deserialize, Serialize};

/// Money amount represented in cents to avoid floating point issues.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money {
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Multiplies the amount by a line quantity.
    pub fn times(&self, quantity: u32) -> Self {
        Self {
            cents: self.cents * i64::from(quantity),
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_arithmetic() {
        let a = Money::from_cents(500);
        let b = Money::from_cents(250);
        assert_eq!((a + b).cents(), 750);
        assert_eq!(a.times(2).cents(), 1000);
    }

    #[test]
    fn money_sum() {
        let total: Money = [Money::from_cents(100), Money::from_cents(23)]
            .into_iter()
            .sum();
        assert_eq!(total.cents(), 123);
    }

    #[test]
    fn money_display() {
        assert_eq!(Money::from_cents(1000).to_string(), "10.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-150).to_string(), "-1.50");
    }

    #[test]
    fn money_ordering() {
        assert!(Money::from_cents(5) < Money::from_cents(10));
    }

    #[test]
    fn money_serializes_as_raw_cents() {
        let json = serde_json::to_string(&Money::from_cents(1000)).unwrap();
        assert_eq!(json, "1000");
    }
}
