//! Monetary value object, stored in cents to avoid floating-point drift.

use serde::{Deserialize, Serialize};

/// An amount of money in cents.
///
/// Seat prices, booking totals and `BookingSeat` price snapshots are all
/// `Money`; arithmetic is checked so a corrupt total fails loudly instead of
/// silently wrapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Creates a `Money` value from a whole number of cents.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents.
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns whether the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two amounts, returning `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }

    /// Sums an iterator of amounts, returning `None` on overflow.
    #[must_use]
    pub fn checked_sum<I: IntoIterator<Item = Self>>(amounts: I) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Self::from_cents(0), |acc, amount| acc.checked_add(amount))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_sum_adds_seat_prices() {
        let total = Money::checked_sum([Money::from_cents(5000), Money::from_cents(2500)]);
        assert_eq!(total, Some(Money::from_cents(7500)));
    }

    #[test]
    fn checked_sum_rejects_overflow() {
        let total = Money::checked_sum([Money::from_cents(u64::MAX), Money::from_cents(1)]);
        assert_eq!(total, None);
    }

    #[test]
    fn display_renders_dollars_and_cents() {
        assert_eq!(Money::from_cents(7550).to_string(), "75.50");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
    }
}
