//! # Order Totals
//!
//! Turns validated order lines and pre-resolved discounts into the amounts
//! stored on an order and its items.
//!
//! ## Calculation
//! ```text
//! line subtotal   = unit_price × quantity
//! line discount   = min(item discount, line subtotal)
//! line total      = line subtotal − line discount
//!
//! subtotal        = Σ line subtotal
//! order discounts = percentage: bps of subtotal (pre-discount)
//!                   fixed:      value
//! discount total  = min(Σ line discount + Σ order discounts, subtotal)
//! total           = subtotal − discount total + tax
//!
//! allocated       = total split over line totals (largest remainder)
//! ```
//!
//! Discount policy (which products a discount covers) is decided before the
//! engine is called; only amounts arrive here.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{apportion, Money};
use crate::types::{DiscountInput, DiscountKind, OrderLineInput};

/// Computed amounts for one order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
    /// Share of the order total carried by the line.
    pub allocated: Money,
}

/// Computed amounts for a whole order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderTotals {
    pub lines: Vec<LineTotals>,
    /// Applied amount of each order-level discount, in input order.
    pub order_discounts: Vec<Money>,
    pub subtotal: Money,
    pub discount_total: Money,
    pub tax: Money,
    pub total: Money,
}

/// Resolves one order-level discount against the pre-discount subtotal.
pub fn discount_amount(discount: &DiscountInput, subtotal: Money) -> Money {
    let raw = match discount.kind {
        DiscountKind::Percentage => subtotal.percentage(discount.value),
        DiscountKind::Fixed => Money::from_cents(discount.value),
    };
    raw.min(subtotal).non_negative()
}

/// Computes every stored amount of an order.
///
/// ## Example
/// ```rust
/// use tally_core::pricing::compute_totals;
/// use tally_core::types::{DiscountInput, DiscountKind, OrderLineInput};
///
/// let lines = vec![OrderLineInput {
///     product_id: "p".into(),
///     quantity: 4,
///     unit_price_cents: 2500,
///     discount_cents: 0,
/// }];
/// let discounts = vec![DiscountInput { discount_id: None, kind: DiscountKind::Percentage, value: 1000 }];
///
/// let totals = compute_totals(&lines, &discounts, 500);
/// assert_eq!(totals.subtotal.cents(), 10000);
/// assert_eq!(totals.discount_total.cents(), 1000);
/// assert_eq!(totals.total.cents(), 9500);
/// ```
pub fn compute_totals(lines: &[OrderLineInput], discounts: &[DiscountInput], tax_cents: i64) -> OrderTotals {
    let mut line_totals: Vec<LineTotals> = lines
        .iter()
        .map(|line| {
            let subtotal = Money::from_cents(line.unit_price_cents).multiply_quantity(line.quantity);
            let discount = Money::from_cents(line.discount_cents).min(subtotal).non_negative();
            LineTotals {
                subtotal,
                discount,
                total: subtotal - discount,
                allocated: Money::zero(),
            }
        })
        .collect();

    let subtotal: Money = line_totals.iter().map(|l| l.subtotal).sum();
    let line_discounts: Money = line_totals.iter().map(|l| l.discount).sum();

    // Order discounts are granted in input order until the subtotal is used up
    let mut headroom = subtotal - line_discounts;
    let order_discounts: Vec<Money> = discounts
        .iter()
        .map(|d| {
            let applied = discount_amount(d, subtotal).min(headroom);
            headroom -= applied;
            applied
        })
        .collect();

    let discount_total = line_discounts + order_discounts.iter().sum::<Money>();
    let tax = Money::from_cents(tax_cents);
    let total = subtotal - discount_total + tax;

    let weights: Vec<Money> = line_totals.iter().map(|l| l.total).collect();
    for (line, share) in line_totals.iter_mut().zip(apportion(total, &weights)) {
        line.allocated = share;
    }

    OrderTotals {
        lines: line_totals,
        order_discounts,
        subtotal,
        discount_total,
        tax,
        total,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i64, unit_price_cents: i64, discount_cents: i64) -> OrderLineInput {
        OrderLineInput {
            product_id: "P".to_string(),
            quantity,
            unit_price_cents,
            discount_cents,
        }
    }

    fn pct(bps: i64) -> DiscountInput {
        DiscountInput {
            discount_id: None,
            kind: DiscountKind::Percentage,
            value: bps,
        }
    }

    fn fixed(cents: i64) -> DiscountInput {
        DiscountInput {
            discount_id: None,
            kind: DiscountKind::Fixed,
            value: cents,
        }
    }

    #[test]
    fn test_plain_totals() {
        let totals = compute_totals(&[line(5, 1000, 0), line(3, 500, 0)], &[], 0);
        assert_eq!(totals.subtotal.cents(), 6500);
        assert_eq!(totals.discount_total.cents(), 0);
        assert_eq!(totals.total.cents(), 6500);
        assert_eq!(totals.lines[0].allocated.cents(), 5000);
        assert_eq!(totals.lines[1].allocated.cents(), 1500);
    }

    #[test]
    fn test_percentage_uses_pre_discount_subtotal() {
        // 10% of 10000 even though a line discount already took 2000 off
        let totals = compute_totals(&[line(10, 1000, 2000)], &[pct(1000)], 0);
        assert_eq!(totals.order_discounts, vec![Money::from_cents(1000)]);
        assert_eq!(totals.discount_total.cents(), 3000);
        assert_eq!(totals.total.cents(), 7000);
    }

    #[test]
    fn test_fixed_discount_capped_at_subtotal() {
        let totals = compute_totals(&[line(1, 1500, 0)], &[fixed(5000)], 0);
        assert_eq!(totals.discount_total.cents(), 1500);
        assert_eq!(totals.total.cents(), 0);
    }

    #[test]
    fn test_stacked_discounts_never_exceed_subtotal() {
        let totals = compute_totals(&[line(2, 1000, 500)], &[pct(5000), fixed(1000)], 300);
        // 500 line + 1000 (50%) + capped 500 fixed
        assert_eq!(totals.order_discounts, vec![Money::from_cents(1000), Money::from_cents(500)]);
        assert_eq!(totals.discount_total.cents(), 2000);
        assert_eq!(totals.total.cents(), 300);
    }

    #[test]
    fn test_line_discount_capped_at_line() {
        let totals = compute_totals(&[line(1, 100, 250)], &[], 0);
        assert_eq!(totals.lines[0].discount.cents(), 100);
        assert_eq!(totals.lines[0].total.cents(), 0);
    }

    #[test]
    fn test_allocation_sums_to_total() {
        let totals = compute_totals(&[line(1, 333, 0), line(1, 333, 0), line(1, 334, 0)], &[pct(1000)], 77);
        let allocated: Money = totals.lines.iter().map(|l| l.allocated).sum();
        assert_eq!(allocated, totals.total);
        assert_eq!(totals.total.cents(), 977);
    }

    #[test]
    fn test_tax_on_free_order_spread_evenly() {
        let totals = compute_totals(&[line(1, 0, 0), line(1, 0, 0)], &[], 101);
        assert_eq!(totals.total.cents(), 101);
        assert_eq!(totals.lines[0].allocated.cents(), 51);
        assert_eq!(totals.lines[1].allocated.cents(), 50);
    }
}
