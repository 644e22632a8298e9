//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Order totals, refunds and payments must reconcile to the cent.         │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  (floating point)                    │
//! │    10 + 20   = 30                   (integer cents)                     │
//! │                                                                         │
//! │  Every amount is stored and computed in minor units. Percentages are    │
//! │  basis points (1000 = 10%). Division rounds half-up, and where a total  │
//! │  is split across lines the split is exact (see `apportion`).            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.cents(), 3297);
//!
//! // 10% of $32.97 = $3.297 → $3.30
//! assert_eq!(line.percentage(1000).cents(), 330);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

/// Basis points in 100%.
pub const BPS_SCALE: i64 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: refund deltas and adjustments can be negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
///
/// ## Where Money Flows
/// ```text
/// OrderItem.unit_price × quantity ──► line subtotal ──► Order.subtotal
///                                                            │
///                         discounts (capped) ◄───────────────┤
///                                                            ▼
///                 Order.total = subtotal − discounts + tax
///                         │
///          ┌──────────────┴──────────────┐
///          ▼                             ▼
///   OrderPayment.amount           RefundItem.amount
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns `bps` basis points of this amount, rounded half-up.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(10000); // $100.00
    /// assert_eq!(subtotal.percentage(1250).cents(), 1250); // 12.5%
    /// ```
    pub fn percentage(&self, bps: i64) -> Money {
        self.scale(bps, BPS_SCALE)
    }

    /// Returns `self × numerator / denominator`, rounded half-up (away from
    /// zero for negative amounts).
    ///
    /// Used for proportional refunds: `line_total.scale(refund_qty, sold_qty)`.
    /// A zero denominator yields zero.
    pub fn scale(&self, numerator: i64, denominator: i64) -> Money {
        if denominator == 0 {
            return Money::zero();
        }
        // i128 keeps large totals × quantities from overflowing
        let product = self.0 as i128 * numerator as i128;
        let den = denominator as i128;
        let sign = product.signum() * den.signum();
        let magnitude = (product.abs() + den.abs() / 2) / den.abs();
        Money((sign * magnitude) as i64)
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    /// Returns the larger of two amounts.
    #[inline]
    pub fn max(self, other: Money) -> Money {
        if self.0 >= other.0 {
            self
        } else {
            other
        }
    }

    /// Clamps negative results to zero.
    #[inline]
    pub fn non_negative(self) -> Money {
        self.max(Money::zero())
    }
}

/// Splits `total` across `weights` proportionally so that the parts add up
/// to `total` exactly (largest remainder method).
///
/// Ties on the remainder go to the earlier weight. When every weight is zero
/// the total is split evenly instead.
///
/// ## Example
/// ```rust
/// use tally_core::money::{apportion, Money};
///
/// let parts = apportion(Money::from_cents(100), &[Money::from_cents(1); 3]);
/// assert_eq!(parts, vec![Money::from_cents(34), Money::from_cents(33), Money::from_cents(33)]);
/// ```
pub fn apportion(total: Money, weights: &[Money]) -> Vec<Money> {
    if weights.is_empty() {
        return Vec::new();
    }

    let mut weights: Vec<i128> = weights.iter().map(|w| w.cents().max(0) as i128).collect();
    if weights.iter().all(|w| *w == 0) {
        weights.iter_mut().for_each(|w| *w = 1);
    }
    let weight_sum: i128 = weights.iter().sum();
    let total_cents = total.cents() as i128;

    let mut parts: Vec<i128> = Vec::with_capacity(weights.len());
    let mut remainders: Vec<(usize, i128)> = Vec::with_capacity(weights.len());
    for (idx, weight) in weights.iter().enumerate() {
        let exact = total_cents * weight;
        parts.push(exact.div_euclid(weight_sum));
        remainders.push((idx, exact.rem_euclid(weight_sum)));
    }

    let mut leftover = total_cents - parts.iter().sum::<i128>();
    // Stable sort keeps earlier lines first among equal remainders
    remainders.sort_by(|a, b| b.1.cmp(&a.1));
    for (idx, _) in remainders {
        if leftover <= 0 {
            break;
        }
        parts[idx] += 1;
        leftover -= 1;
    }

    parts.into_iter().map(|p| Money::from_cents(p as i64)).collect()
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented display; the dashboard formats money itself.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-a).cents(), -1000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 8.25% of $10.00 = 82.5 cents → 83
        assert_eq!(Money::from_cents(1000).percentage(825).cents(), 83);
        assert_eq!(Money::from_cents(10000).percentage(1000).cents(), 1000);
        assert_eq!(Money::from_cents(999).percentage(0).cents(), 0);
    }

    #[test]
    fn test_scale() {
        // 2 of 5 units of a $10.00 line
        assert_eq!(Money::from_cents(1000).scale(2, 5).cents(), 400);
        // 1 of 3 units of $10.00 = 333.33 → 333
        assert_eq!(Money::from_cents(1000).scale(1, 3).cents(), 333);
        // 2 of 3 units of $10.00 = 666.67 → 667
        assert_eq!(Money::from_cents(1000).scale(2, 3).cents(), 667);
        assert_eq!(Money::from_cents(-1000).scale(2, 3).cents(), -667);
        assert_eq!(Money::from_cents(1000).scale(1, 0).cents(), 0);
    }

    #[test]
    fn test_apportion_sums_exactly() {
        let weights = [
            Money::from_cents(3333),
            Money::from_cents(3333),
            Money::from_cents(3334),
        ];
        let parts = apportion(Money::from_cents(9001), &weights);
        assert_eq!(parts.iter().sum::<Money>().cents(), 9001);
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn test_apportion_zero_weights_split_evenly() {
        let parts = apportion(Money::from_cents(10), &[Money::zero(), Money::zero()]);
        assert_eq!(parts, vec![Money::from_cents(5), Money::from_cents(5)]);
    }

    #[test]
    fn test_apportion_proportional() {
        let parts = apportion(
            Money::from_cents(180),
            &[Money::from_cents(100), Money::from_cents(200)],
        );
        assert_eq!(parts, vec![Money::from_cents(60), Money::from_cents(120)]);
    }

    #[test]
    fn test_min_max_non_negative() {
        let a = Money::from_cents(-5);
        let b = Money::from_cents(7);
        assert_eq!(a.min(b), a);
        assert_eq!(a.max(b), b);
        assert_eq!(a.non_negative(), Money::zero());
    }
}
