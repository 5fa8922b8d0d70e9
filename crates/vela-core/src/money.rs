//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer VND                                              │
//! │    VND has no minor unit, so every amount is a whole number of dong.    │
//! │    Subtotals, discounts and gateway amounts are all exact i64 math.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vela_core::money::Money;
//!
//! let price = Money::from_vnd(150_000);
//! let line = price * 2;                       // 300_000₫
//! let total = line - Money::from_vnd(15_000); // 285_000₫
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole Vietnamese dong.
///
/// ## Design Decisions
/// - **i64 (signed)**: allows negative intermediates for discount math
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON serialization
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole dong.
    #[inline]
    pub const fn from_vnd(vnd: i64) -> Self {
        Money(vnd)
    }

    /// Returns the value in whole dong.
    #[inline]
    pub const fn vnd(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use vela_core::money::Money;
    ///
    /// let unit_price = Money::from_vnd(45_000);
    /// assert_eq!(unit_price.multiply_quantity(3).vnd(), 135_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Computes a percentage of this amount, rounded to the nearest dong.
    ///
    /// Used by the voucher evaluator: `subtotal.percentage(10.0)` is the
    /// 10% share of the subtotal.
    pub fn percentage(&self, percent: f64) -> Money {
        Money((self.0 as f64 * percent / 100.0).round() as i64)
    }

    /// Clamps this amount into `[0, max]`.
    ///
    /// Discounts must never be negative and never exceed the subtotal.
    #[inline]
    pub fn clamp_discount(&self, max: Money) -> Money {
        Money(self.0.clamp(0, max.0))
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        Money(self.0.min(other.0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// For debugging and notification text; frontends format for display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}₫", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vnd() {
        let money = Money::from_vnd(150_000);
        assert_eq!(money.vnd(), 150_000);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_vnd(100_000);
        let b = Money::from_vnd(15_000);

        assert_eq!((a + b).vnd(), 115_000);
        assert_eq!((a - b).vnd(), 85_000);
        assert_eq!((a * 3).vnd(), 300_000);
    }

    #[test]
    fn test_percentage_rounds_to_nearest_dong() {
        let subtotal = Money::from_vnd(100_000);
        assert_eq!(subtotal.percentage(10.0).vnd(), 10_000);

        // 33_333 * 10% = 3_333.3 → 3_333
        assert_eq!(Money::from_vnd(33_333).percentage(10.0).vnd(), 3_333);
        // 15 * 50% = 7.5 → 8
        assert_eq!(Money::from_vnd(15).percentage(50.0).vnd(), 8);
    }

    #[test]
    fn test_clamp_discount() {
        let subtotal = Money::from_vnd(10_000);

        // discount larger than subtotal is capped
        let discount = Money::from_vnd(15_000);
        assert_eq!(discount.clamp_discount(subtotal).vnd(), 10_000);

        // negative intermediates clamp to zero
        let negative = Money::from_vnd(-500);
        assert_eq!(negative.clamp_discount(subtotal).vnd(), 0);

        // in-range discount is untouched
        let ok = Money::from_vnd(2_000);
        assert_eq!(ok.clamp_discount(subtotal).vnd(), 2_000);
    }

    #[test]
    fn test_sum() {
        let lines = vec![
            Money::from_vnd(45_000),
            Money::from_vnd(90_000),
            Money::from_vnd(15_000),
        ];
        let subtotal: Money = lines.into_iter().sum();
        assert_eq!(subtotal.vnd(), 150_000);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_vnd(85_000)), "85000₫");
    }
}
