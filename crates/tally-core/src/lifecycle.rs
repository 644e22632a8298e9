//! # Order Lifecycle
//!
//! The order state graph and the payment status rules.
//!
//! ## State Graph
//! ```text
//!              ┌──────────► paid ─────────┐
//!              │              │           │
//!   pending ───┤              ▼           ▼
//!              ├──────────► shipped ──► delivered
//!              │
//!              └──────────► cancelled
//! ```
//!
//! Stock is committed when the order is created, so `cancelled` is only
//! reachable from `pending`. Orders that were paid or shipped are unwound
//! through refunds instead.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Order, OrderStatus, PaymentStatus};

// =============================================================================
// State Graph
// =============================================================================

/// Statuses reachable from `from` in one step.
pub fn next_statuses(from: OrderStatus) -> &'static [OrderStatus] {
    match from {
        OrderStatus::Pending => &[OrderStatus::Paid, OrderStatus::Shipped, OrderStatus::Cancelled],
        OrderStatus::Paid => &[OrderStatus::Shipped, OrderStatus::Delivered],
        OrderStatus::Shipped => &[OrderStatus::Delivered],
        OrderStatus::Delivered | OrderStatus::Cancelled => &[],
    }
}

/// Whether `from → to` is an edge of the graph.
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    next_statuses(from).contains(&to)
}

/// Fails with `InvalidStateTransition` unless `from → to` is legal.
pub fn ensure_transition(order_id: &str, from: OrderStatus, to: OrderStatus) -> CoreResult<()> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::InvalidStateTransition {
            order_id: order_id.to_string(),
            from,
            to,
        })
    }
}

/// Whether the order accepts no further fulfillment changes.
pub fn is_terminal(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Delivered | OrderStatus::Cancelled)
}

/// Payments are accepted until the order is delivered or cancelled.
pub fn ensure_accepts_payment(order: &Order) -> CoreResult<()> {
    if is_terminal(order.status) {
        return Err(CoreError::OrderClosed {
            order_id: order.id.clone(),
            status: order.status,
            operation: "apply payment".to_string(),
        });
    }
    Ok(())
}

/// Refunds apply to orders whose stock is committed and that were not
/// cancelled. A pending order is cancelled instead of refunded.
pub fn ensure_accepts_refund(order: &Order) -> CoreResult<()> {
    match order.status {
        OrderStatus::Paid | OrderStatus::Shipped | OrderStatus::Delivered => Ok(()),
        OrderStatus::Pending | OrderStatus::Cancelled => Err(CoreError::OrderClosed {
            order_id: order.id.clone(),
            status: order.status,
            operation: "refund".to_string(),
        }),
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Derives the payment status from the paid sum and the effective total.
///
/// ## Example
/// ```rust
/// use tally_core::lifecycle::payment_status;
/// use tally_core::money::Money;
/// use tally_core::types::PaymentStatus;
///
/// let total = Money::from_cents(200);
/// assert_eq!(payment_status(Money::zero(), total), PaymentStatus::Unpaid);
/// assert_eq!(payment_status(Money::from_cents(120), total), PaymentStatus::PartiallyPaid);
/// assert_eq!(payment_status(Money::from_cents(200), total), PaymentStatus::Paid);
/// ```
pub fn payment_status(paid: Money, effective_total: Money) -> PaymentStatus {
    if paid >= effective_total {
        PaymentStatus::Paid
    } else if paid.is_zero() {
        PaymentStatus::Unpaid
    } else {
        PaymentStatus::PartiallyPaid
    }
}

/// Checks a new payment against the order and returns the resulting paid
/// sum and status.
///
/// Fails with `OrderClosed` on delivered/cancelled orders and with
/// `Overpayment` when the paid sum would exceed the effective total.
pub fn apply_payment(order: &Order, amount: Money) -> CoreResult<(Money, PaymentStatus)> {
    ensure_accepts_payment(order)?;

    let effective = order.effective_total();
    let remaining = (effective - order.paid()).non_negative();
    if amount > remaining {
        return Err(CoreError::Overpayment {
            order_id: order.id.clone(),
            attempted: amount,
            remaining,
        });
    }

    let paid = order.paid() + amount;
    Ok((paid, payment_status(paid, effective)))
}

/// Money position of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentSummary {
    pub total: Money,
    pub refunded: Money,
    /// total − refunded.
    pub effective_total: Money,
    pub paid: Money,
    /// Still owed by the customer.
    pub balance_due: Money,
    /// Owed back to the customer after refunds; paid out externally.
    pub refund_due: Money,
    pub status: PaymentStatus,
}

impl PaymentSummary {
    pub fn of(order: &Order) -> Self {
        let effective_total = order.effective_total();
        let paid = order.paid();
        PaymentSummary {
            total: order.total(),
            refunded: order.refunded(),
            effective_total,
            paid,
            balance_due: (effective_total - paid).non_negative(),
            refund_due: (paid - effective_total).non_negative(),
            status: payment_status(paid, effective_total),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn order(status: OrderStatus, total: i64, paid: i64, refunded: i64) -> Order {
        let now = Utc::now();
        Order {
            id: "O1".to_string(),
            business_id: "B1".to_string(),
            customer_id: None,
            created_by: "U1".to_string(),
            status,
            payment_status: PaymentStatus::Unpaid,
            subtotal_cents: total,
            discount_cents: 0,
            tax_cents: 0,
            total_cents: total,
            refunded_cents: refunded,
            paid_cents: paid,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_legal_transitions() {
        use OrderStatus::*;
        assert!(can_transition(Pending, Paid));
        assert!(can_transition(Pending, Shipped));
        assert!(can_transition(Pending, Cancelled));
        assert!(can_transition(Paid, Shipped));
        assert!(can_transition(Paid, Delivered));
        assert!(can_transition(Shipped, Delivered));
    }

    #[test]
    fn test_illegal_transitions() {
        use OrderStatus::*;
        assert!(!can_transition(Paid, Cancelled));
        assert!(!can_transition(Shipped, Cancelled));
        assert!(!can_transition(Pending, Delivered));
        assert!(!can_transition(Delivered, Pending));
        assert!(!can_transition(Cancelled, Paid));
        assert!(!can_transition(Paid, Paid));

        let err = ensure_transition("O1", Shipped, Paid).unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidStateTransition {
                order_id: "O1".to_string(),
                from: Shipped,
                to: Paid,
            }
        );
    }

    #[test]
    fn test_payment_sequence() {
        let mut o = order(OrderStatus::Pending, 200, 0, 0);

        let (paid, status) = apply_payment(&o, Money::from_cents(120)).unwrap();
        assert_eq!(status, PaymentStatus::PartiallyPaid);
        o.paid_cents = paid.cents();

        let (paid, status) = apply_payment(&o, Money::from_cents(80)).unwrap();
        assert_eq!(status, PaymentStatus::Paid);
        o.paid_cents = paid.cents();

        let err = apply_payment(&o, Money::from_cents(1)).unwrap_err();
        assert!(matches!(err, CoreError::Overpayment { remaining, .. } if remaining.is_zero()));
    }

    #[test]
    fn test_payment_capped_by_refunds() {
        let o = order(OrderStatus::Paid, 200, 0, 50);
        assert!(apply_payment(&o, Money::from_cents(151)).is_err());
        let (_, status) = apply_payment(&o, Money::from_cents(150)).unwrap();
        assert_eq!(status, PaymentStatus::Paid);
    }

    #[test]
    fn test_payment_rejected_on_closed_order() {
        let o = order(OrderStatus::Cancelled, 200, 0, 0);
        assert!(matches!(
            apply_payment(&o, Money::from_cents(10)),
            Err(CoreError::OrderClosed { .. })
        ));
    }

    #[test]
    fn test_refund_acceptance() {
        assert!(ensure_accepts_refund(&order(OrderStatus::Delivered, 1, 1, 0)).is_ok());
        assert!(ensure_accepts_refund(&order(OrderStatus::Pending, 1, 0, 0)).is_err());
        assert!(ensure_accepts_refund(&order(OrderStatus::Cancelled, 1, 0, 0)).is_err());
    }

    #[test]
    fn test_summary_after_refund() {
        let summary = PaymentSummary::of(&order(OrderStatus::Paid, 200, 200, 80));
        assert_eq!(summary.effective_total.cents(), 120);
        assert_eq!(summary.balance_due.cents(), 0);
        assert_eq!(summary.refund_due.cents(), 80);
        assert_eq!(summary.status, PaymentStatus::Paid);

        let summary = PaymentSummary::of(&order(OrderStatus::Paid, 200, 200, 200));
        assert_eq!(summary.effective_total.cents(), 0);
        assert_eq!(summary.status, PaymentStatus::Paid);

        let summary = PaymentSummary::of(&order(OrderStatus::Pending, 200, 50, 0));
        assert_eq!(summary.balance_due.cents(), 150);
        assert_eq!(summary.status, PaymentStatus::PartiallyPaid);
    }
}
