//! # Refund Processing
//!
//! Reverses sold units of an order: stock goes back to the entries it was
//! drawn from, the order's effective total drops by the refunded amount and
//! its payment status is derived again.
//!
//! ## One Refund
//! ```text
//! refund(order, Partial [{item 1, qty 2}])
//!     │
//!     ├── order paid/shipped/delivered?      no ──► OrderClosed
//!     ├── qty ≤ item's refundable units?     no ──► RefundExceedsOriginal
//!     │
//!     ├── INSERT refund (processed, amount)
//!     ├── per line:
//!     │     IN movements, most recently drawn entry first
//!     │     item.refunded_quantity += qty, item.refunded_cents += amount
//!     │     INSERT refund item
//!     └── order.refunded_cents += amount, payment status re-derived
//! ```
//!
//! Everything above commits together. If storage fails part way, nothing
//! of it remains and a `failed` refund with no items is recorded on its own.
//! Paying the money back happens outside the engine; `refund_due` in the
//! payment summary is what is owed.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::Action;
use crate::engine::TenantSession;
use crate::error::{EngineError, EngineResult};
use crate::movements::{post, Posting};
use tally_core::allocation::plan_reversal;
use tally_core::lifecycle::{ensure_accepts_refund, payment_status};
use tally_core::refund::{refund_total, resolve_lines};
use tally_core::validation::{validate_id, validate_refund_request};
use tally_core::{
    Money, MovementReason, MovementType, Refund, RefundItem, RefundRequest, RefundStatus,
};

/// A refund and the item lines it returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundDetails {
    pub refund: Refund,
    pub items: Vec<RefundItem>,
}

impl TenantSession {
    /// Refunds units of an order.
    ///
    /// `Full` takes every unrefunded unit of every item; `Partial` takes the
    /// listed items and quantities. On a storage failure the error is
    /// returned after a `failed` refund has been recorded.
    pub async fn refund(&self, order_id: &str, request: RefundRequest) -> EngineResult<RefundDetails> {
        self.authorize(Action::Refund)?;
        validate_id("order_id", order_id)?;
        validate_refund_request(&request)?;

        let request = &request;
        let result = self
            .retrying("refund", move || self.apply_refund(order_id, request))
            .await;

        match result {
            Ok(details) => {
                info!(
                    order_id = %order_id,
                    refund_id = %details.refund.id,
                    amount_cents = details.refund.amount_cents,
                    items = details.items.len(),
                    "Refund processed"
                );
                Ok(details)
            }
            Err(EngineError::Storage(reason)) => {
                warn!(order_id = %order_id, reason = %reason, "Refund failed, recording failure");
                if let Err(e) = self.record_failed_refund(order_id, request, &reason).await {
                    error!(order_id = %order_id, error = %e, "Could not record failed refund");
                }
                Err(EngineError::Storage(reason))
            }
            Err(e) => Err(e),
        }
    }

    /// Every refund recorded against an order, processed or failed, oldest
    /// first.
    pub async fn refunds_for_order(&self, order_id: &str) -> EngineResult<Vec<RefundDetails>> {
        self.authorize(Action::ViewOrders)?;
        validate_id("order_id", order_id)?;

        let mut tx = self.begin().await?;
        tx.orders().get(order_id).await?;
        let refunds = tx.refunds().for_order(order_id).await?;

        let mut details = Vec::with_capacity(refunds.len());
        for refund in refunds {
            let items = tx.refunds().items(&refund.id).await?;
            details.push(RefundDetails { refund, items });
        }
        tx.commit().await?;
        Ok(details)
    }

    async fn apply_refund(&self, order_id: &str, request: &RefundRequest) -> EngineResult<RefundDetails> {
        let now = self.now();
        let mut tx = self.begin().await?;

        let order = tx.orders().get(order_id).await?;
        ensure_accepts_refund(&order)?;

        let items = tx.orders().items(order_id).await?;
        let lines = resolve_lines(order_id, request, &items)?;
        let amount = refund_total(&lines);

        let refund = Refund {
            id: Uuid::new_v4().to_string(),
            business_id: self.business_id().to_string(),
            order_id: order.id.clone(),
            refund_type: request.refund_type,
            status: RefundStatus::Processed,
            amount_cents: amount.cents(),
            reason: request.reason.clone(),
            failure_reason: None,
            created_by: self.user_id().to_string(),
            created_at: now,
        };
        tx.refunds().insert(&refund).await?;

        let mut refund_items = Vec::with_capacity(lines.len());
        for line in &lines {
            let Some(item) = items.iter().find(|i| i.id == line.order_item_id) else {
                continue;
            };

            let slices = tx.movements().drawn_slices(&item.id).await?;
            let plan = plan_reversal(&item.product_id, line.quantity, &slices)?;
            for (entry_id, quantity) in &plan {
                post(
                    &mut tx,
                    Posting {
                        entry_id,
                        quantity: *quantity,
                        movement_type: MovementType::In,
                        reason: MovementReason::Refund,
                        reference_id: Some(item.id.as_str()),
                        note: Some(refund.id.as_str()),
                    },
                    self.user_id(),
                    now,
                )
                .await?;
            }

            tx.orders()
                .add_item_refund(item, line.quantity, line.amount.cents())
                .await?;

            let row = RefundItem {
                id: Uuid::new_v4().to_string(),
                business_id: self.business_id().to_string(),
                refund_id: refund.id.clone(),
                order_item_id: item.id.clone(),
                product_id: item.product_id.clone(),
                quantity: line.quantity,
                amount_cents: line.amount.cents(),
            };
            tx.refunds().insert_item(&row).await?;
            refund_items.push(row);
        }

        let refunded = order.refunded() + amount;
        let status = payment_status(order.paid(), order.total() - refunded);
        tx.orders()
            .set_refunded(order_id, order.refunded_cents, refunded.cents(), status, now)
            .await?;

        tx.commit().await?;

        Ok(RefundDetails {
            refund,
            items: refund_items,
        })
    }

    async fn record_failed_refund(&self, order_id: &str, request: &RefundRequest, reason: &str) -> EngineResult<Refund> {
        let mut tx = self.begin().await?;
        let order = tx.orders().get(order_id).await?;

        let refund = Refund {
            id: Uuid::new_v4().to_string(),
            business_id: self.business_id().to_string(),
            order_id: order.id,
            refund_type: request.refund_type,
            status: RefundStatus::Failed,
            amount_cents: Money::zero().cents(),
            reason: request.reason.clone(),
            failure_reason: Some(reason.to_string()),
            created_by: self.user_id().to_string(),
            created_at: self.now(),
        };
        tx.refunds().insert(&refund).await?;
        tx.commit().await?;
        Ok(refund)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{line, order, product, shop, stock, Shop};
    use chrono::Duration;
    use tally_core::{OrderStatus, PaymentMethod, PaymentStatus, RefundLineInput, RefundType, ValidationError};

    use crate::fulfillment::OrderDetails;

    fn partial(lines: &[(&str, i64)]) -> RefundRequest {
        RefundRequest {
            refund_type: RefundType::Partial,
            items: lines
                .iter()
                .map(|(id, quantity)| RefundLineInput {
                    order_item_id: id.to_string(),
                    quantity: *quantity,
                })
                .collect(),
            reason: Some("customer return".to_string()),
        }
    }

    fn full() -> RefundRequest {
        RefundRequest {
            refund_type: RefundType::Full,
            items: Vec::new(),
            reason: None,
        }
    }

    /// Order of 5 rice and 3 tea, advanced to paid.
    async fn paid_order(shop: &Shop) -> OrderDetails {
        let rice = product(&shop.session, "RICE").await;
        let tea = product(&shop.session, "TEA").await;
        stock(shop, &rice.id, 20, None).await;
        stock(shop, &tea.id, 20, None).await;

        let details = shop
            .session
            .create_order(order(vec![line(&rice.id, 5, 400), line(&tea.id, 3, 300)]))
            .await
            .unwrap();
        shop.session.advance(&details.order.id, OrderStatus::Paid).await.unwrap();
        details
    }

    #[tokio::test]
    async fn test_partial_refund_returns_stock_and_caps_further_refunds() {
        let shop = shop().await;
        let details = paid_order(&shop).await;
        let item = &details.items[0];

        let refund = shop
            .session
            .refund(&details.order.id, partial(&[(item.id.as_str(), 2)]))
            .await
            .unwrap();
        assert_eq!(refund.refund.status, RefundStatus::Processed);
        assert_eq!(refund.items.len(), 1);
        assert_eq!(refund.items[0].quantity, 2);
        assert_eq!(refund.refund.amount_cents, 800);

        let after = shop.session.get_order(&details.order.id).await.unwrap();
        assert_eq!(after.items[0].refundable_quantity(), 3);
        assert_eq!(after.order.refunded_cents, 800);

        let movements = shop.session.movements_for_reference(&item.id).await.unwrap();
        let back: Vec<&tally_core::InventoryMovement> =
            movements.iter().filter(|m| m.reason == MovementReason::Refund).collect();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].movement_type, MovementType::In);
        assert_eq!(back[0].quantity, 2);
        assert_eq!(back[0].note.as_deref(), Some(refund.refund.id.as_str()));
        assert_eq!(shop.session.get_product(&item.product_id).await.unwrap().quantity, 17);

        let err = shop
            .session
            .refund(&details.order.id, partial(&[(item.id.as_str(), 4)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::RefundExceedsOriginal { requested: 4, refundable: 3, .. }
        ));
    }

    #[tokio::test]
    async fn test_refund_reverses_latest_drawn_entry_first() {
        let shop = shop().await;
        let rice = product(&shop.session, "RICE").await;
        let sooner = stock(&shop, &rice.id, 10, Some((2026, 4, 1))).await;
        let later = stock(&shop, &rice.id, 10, Some((2026, 6, 1))).await;

        let details = shop
            .session
            .create_order(order(vec![line(&rice.id, 15, 400)]))
            .await
            .unwrap();
        shop.session.advance(&details.order.id, OrderStatus::Shipped).await.unwrap();

        shop.session
            .refund(&details.order.id, partial(&[(details.items[0].id.as_str(), 7)]))
            .await
            .unwrap();

        // 5 were drawn from the later entry, so it gets all 5 back
        assert_eq!(shop.session.audit_entry(&later.id).await.unwrap().materialized, 10);
        assert_eq!(shop.session.audit_entry(&sooner.id).await.unwrap().materialized, 2);
    }

    #[tokio::test]
    async fn test_full_refund_returns_whole_total() {
        let shop = shop().await;
        let details = paid_order(&shop).await;
        let id = details.order.id.as_str();
        shop.session
            .apply_payment(id, details.order.total_cents, PaymentMethod::Card, None)
            .await
            .unwrap();

        let refund = shop.session.refund(id, full()).await.unwrap();
        assert_eq!(refund.refund.amount_cents, details.order.total_cents);
        assert_eq!(refund.items.len(), 2);

        let summary = shop.session.payment_summary(id).await.unwrap();
        assert_eq!(summary.effective_total, Money::zero());
        assert_eq!(summary.status, PaymentStatus::Paid);
        assert_eq!(summary.refund_due.cents(), details.order.total_cents);

        for item in &details.items {
            assert_eq!(shop.session.get_product(&item.product_id).await.unwrap().quantity, 20);
        }

        let err = shop.session.refund(id, full()).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(ValidationError::Unusable { .. })));
    }

    #[tokio::test]
    async fn test_refund_drops_balance_due() {
        let shop = shop().await;
        let details = paid_order(&shop).await;
        let id = details.order.id.as_str();
        // Total 2900; 2100 paid so far
        shop.session.apply_payment(id, 2100, PaymentMethod::Cash, None).await.unwrap();
        assert_eq!(
            shop.session.payment_summary(id).await.unwrap().status,
            PaymentStatus::PartiallyPaid
        );

        // Returning all 5 rice (2000) leaves an effective total of 900
        shop.session
            .refund(id, partial(&[(details.items[0].id.as_str(), 5)]))
            .await
            .unwrap();

        let summary = shop.session.payment_summary(id).await.unwrap();
        assert_eq!(summary.effective_total.cents(), 900);
        assert_eq!(summary.status, PaymentStatus::Paid);
        assert_eq!(summary.refund_due.cents(), 1200);
    }

    #[tokio::test]
    async fn test_pending_orders_are_cancelled_not_refunded() {
        let shop = shop().await;
        let rice = product(&shop.session, "RICE").await;
        stock(&shop, &rice.id, 10, None).await;
        let details = shop
            .session
            .create_order(order(vec![line(&rice.id, 2, 400)]))
            .await
            .unwrap();

        let err = shop.session.refund(&details.order.id, full()).await.unwrap_err();
        assert!(matches!(err, EngineError::OrderClosed { status: OrderStatus::Pending, .. }));
    }

    #[tokio::test]
    async fn test_item_from_another_order_rejected() {
        let shop = shop().await;
        let details = paid_order(&shop).await;
        let other = shop
            .session
            .create_order(order(vec![line(&details.items[0].product_id, 1, 400)]))
            .await
            .unwrap();

        let err = shop
            .session
            .refund(&details.order.id, partial(&[(other.items[0].id.as_str(), 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(ValidationError::Unusable { .. })));
    }

    #[tokio::test]
    async fn test_storage_failure_records_failed_refund() {
        let shop = shop().await;
        let details = paid_order(&shop).await;
        let item = &details.items[0];

        sqlx::query(
            r#"
            CREATE TRIGGER fail_refund_movements
            BEFORE INSERT ON inventory_movements
            WHEN NEW.reason = 'refund'
            BEGIN
                SELECT RAISE(ABORT, 'injected refund failure');
            END
            "#,
        )
        .execute(shop.engine.database().pool())
        .await
        .unwrap();

        shop.clock.advance(Duration::minutes(5));
        let err = shop
            .session
            .refund(&details.order.id, partial(&[(item.id.as_str(), 2)]))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Storage(_)));

        let refunds = shop.session.refunds_for_order(&details.order.id).await.unwrap();
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].refund.status, RefundStatus::Failed);
        assert_eq!(refunds[0].refund.amount_cents, 0);
        assert!(refunds[0].refund.failure_reason.is_some());
        assert!(refunds[0].items.is_empty());

        let after = shop.session.get_order(&details.order.id).await.unwrap();
        assert_eq!(after.order.refunded_cents, 0);
        assert_eq!(after.items[0].refunded_quantity, 0);
        assert_eq!(shop.session.get_product(&item.product_id).await.unwrap().quantity, 15);
    }
}
