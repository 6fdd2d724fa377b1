//! # Money
//!
//! Every amount in Meridian (prices, discounts, shipping, order totals) is
//! an integer count of minor units. A costing computed twice yields the
//! same cents.
//!
//! ```rust
//! use meridian_core::money::Money;
//!
//! let line = Money::from_cents(1999).checked_mul_quantity(3).unwrap();
//! assert_eq!(line.cents(), 5997);
//! // 20% of 59.97 is 11.994, rounded half-up to 11.99
//! assert_eq!(line.percentage(2000).cents(), 1199);
//! ```
//!
//! Multiplication and addition are checked and return `None` on overflow;
//! callers turn that into [`CoreError::AmountOverflow`](crate::CoreError).

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Basis points in one whole (100%).
pub const BPS_SCALE: i64 = 10_000;

/// Minor units of the single store currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    const fn major(&self) -> i64 {
        self.0 / 100
    }

    #[inline]
    const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Unit price times quantity, `None` on overflow.
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Sum of `amounts`, `None` as soon as a partial sum overflows.
    pub fn checked_sum<I>(amounts: I) -> Option<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    /// `bps` basis points of this amount, rounded half-up. Computed in
    /// i128 so large totals cannot overflow the intermediate product.
    ///
    /// ```rust
    /// use meridian_core::money::Money;
    ///
    /// // 8.25% of 10.00 = 0.825 → 0.83
    /// assert_eq!(Money::from_cents(1000).percentage(825).cents(), 83);
    /// ```
    pub fn percentage(&self, bps: i64) -> Money {
        let half = (BPS_SCALE / 2) as i128;
        let cents = (self.0 as i128 * bps as i128 + half) / BPS_SCALE as i128;
        Money::from_cents(cents as i64)
    }

    /// Subtraction that never goes below zero.
    #[inline]
    pub fn saturating_sub_floor(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0).max(0))
    }
}

/// Plain decimal rendering for logs. The frontend does locale formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}
