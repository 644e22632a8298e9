//! # Payment Reconciliation
//!
//! Records payment facts against orders and keeps the order's paid sum and
//! payment status in step with them.
//!
//! ```text
//!   total 200, paid 0     unpaid
//!        + 120       ──►  partially_paid   (balance 80)
//!        +  80       ──►  paid             (balance 0)
//!        +   1       ──►  Overpayment { remaining: 0 }
//! ```
//!
//! Payment status follows the money only. The order's fulfillment status is
//! moved separately with `advance`.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::Action;
use crate::engine::TenantSession;
use crate::error::EngineResult;
use tally_core::lifecycle::{apply_payment, PaymentSummary};
use tally_core::validation::{validate_id, validate_payment_amount};
use tally_core::{Money, OrderPayment, PaymentMethod};

/// A recorded payment and the order's money position after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment: OrderPayment,
    pub summary: PaymentSummary,
}

impl TenantSession {
    /// Records a payment against an order.
    ///
    /// Fails with `Overpayment` if the paid sum would exceed the order's
    /// effective total, and with `OrderClosed` on delivered or cancelled
    /// orders.
    pub async fn apply_payment(
        &self,
        order_id: &str,
        amount_cents: i64,
        method: PaymentMethod,
        reference: Option<String>,
    ) -> EngineResult<PaymentReceipt> {
        self.authorize(Action::ApplyPayment)?;
        validate_id("order_id", order_id)?;
        validate_payment_amount(amount_cents)?;

        let reference = &reference;
        let receipt = self
            .retrying("apply_payment", move || async move {
                let now = self.now();
                let mut tx = self.begin().await?;

                let order = tx.orders().get(order_id).await?;
                let (paid, status) = apply_payment(&order, Money::from_cents(amount_cents))?;

                let payment = OrderPayment {
                    id: Uuid::new_v4().to_string(),
                    business_id: self.business_id().to_string(),
                    order_id: order.id.clone(),
                    amount_cents,
                    method,
                    reference: reference.clone(),
                    created_by: self.user_id().to_string(),
                    created_at: now,
                };
                tx.payments().insert(&payment).await?;
                tx.orders()
                    .set_paid(order_id, order.paid_cents, paid.cents(), status, now)
                    .await?;

                let updated = tx.orders().get(order_id).await?;
                tx.commit().await?;

                Ok(PaymentReceipt {
                    payment,
                    summary: PaymentSummary::of(&updated),
                })
            })
            .await?;

        info!(
            order_id = %order_id,
            amount_cents,
            method = ?method,
            payment_status = ?receipt.summary.status,
            "Payment applied"
        );
        Ok(receipt)
    }

    /// Total, refunded, effective total, paid, balance due and refund due.
    pub async fn payment_summary(&self, order_id: &str) -> EngineResult<PaymentSummary> {
        self.authorize(Action::ViewOrders)?;
        validate_id("order_id", order_id)?;

        let mut tx = self.begin().await?;
        let order = tx.orders().get(order_id).await?;
        tx.commit().await?;
        Ok(PaymentSummary::of(&order))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::test_support::{line, order, product, shop, stock};
    use tally_core::{OrderStatus, PaymentStatus, ValidationError};

    #[tokio::test]
    async fn test_payments_move_status_to_paid() {
        let shop = shop().await;
        let rice = product(&shop.session, "RICE").await;
        stock(&shop, &rice.id, 10, None).await;
        let details = shop
            .session
            .create_order(order(vec![line(&rice.id, 1, 200)]))
            .await
            .unwrap();
        let id = details.order.id.as_str();

        let first = shop.session.apply_payment(id, 120, PaymentMethod::Cash, None).await.unwrap();
        assert_eq!(first.summary.status, PaymentStatus::PartiallyPaid);
        assert_eq!(first.summary.balance_due.cents(), 80);

        let second = shop
            .session
            .apply_payment(id, 80, PaymentMethod::Card, Some("AUTH-5521".to_string()))
            .await
            .unwrap();
        assert_eq!(second.summary.status, PaymentStatus::Paid);
        assert_eq!(second.summary.balance_due, Money::zero());
        assert_eq!(second.payment.reference.as_deref(), Some("AUTH-5521"));

        let err = shop.session.apply_payment(id, 1, PaymentMethod::Cash, None).await.unwrap_err();
        match err {
            EngineError::Overpayment { attempted, remaining, .. } => {
                assert_eq!(attempted.cents(), 1);
                assert_eq!(remaining, Money::zero());
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let details = shop.session.get_order(id).await.unwrap();
        assert_eq!(details.payments.len(), 2);
        assert_eq!(details.order.paid_cents, 200);
        // Paying does not move the order along
        assert_eq!(details.order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_payment_larger_than_balance_rejected() {
        let shop = shop().await;
        let rice = product(&shop.session, "RICE").await;
        stock(&shop, &rice.id, 10, None).await;
        let details = shop
            .session
            .create_order(order(vec![line(&rice.id, 1, 200)]))
            .await
            .unwrap();

        let err = shop
            .session
            .apply_payment(&details.order.id, 201, PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Overpayment { .. }));

        let summary = shop.session.payment_summary(&details.order.id).await.unwrap();
        assert_eq!(summary.paid, Money::zero());
        assert_eq!(summary.status, PaymentStatus::Unpaid);
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected() {
        let shop = shop().await;
        let rice = product(&shop.session, "RICE").await;
        stock(&shop, &rice.id, 10, None).await;
        let details = shop
            .session
            .create_order(order(vec![line(&rice.id, 1, 200)]))
            .await
            .unwrap();

        let err = shop
            .session
            .apply_payment(&details.order.id, 0, PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(ValidationError::MustBePositive { .. })));
    }

    #[tokio::test]
    async fn test_closed_orders_take_no_payments() {
        let shop = shop().await;
        let rice = product(&shop.session, "RICE").await;
        stock(&shop, &rice.id, 10, None).await;
        let details = shop
            .session
            .create_order(order(vec![line(&rice.id, 1, 200)]))
            .await
            .unwrap();
        shop.session.cancel(&details.order.id).await.unwrap();

        let err = shop
            .session
            .apply_payment(&details.order.id, 50, PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::OrderClosed { status: OrderStatus::Cancelled, .. }
        ));
    }

    #[tokio::test]
    async fn test_cancel_refused_once_paid() {
        let shop = shop().await;
        let rice = product(&shop.session, "RICE").await;
        stock(&shop, &rice.id, 10, None).await;
        let details = shop
            .session
            .create_order(order(vec![line(&rice.id, 1, 200)]))
            .await
            .unwrap();
        shop.session
            .apply_payment(&details.order.id, 50, PaymentMethod::Cash, None)
            .await
            .unwrap();

        let err = shop.session.cancel(&details.order.id).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(ValidationError::Unusable { .. })));
        assert_eq!(shop.session.get_product(&rice.id).await.unwrap().quantity, 9);
    }
}
