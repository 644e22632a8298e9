//! # Order Fulfillment
//!
//! Order creation, the order state machine and cancellation.
//!
//! ## Creating an Order
//! ```text
//! create_order(NewOrder)
//!     │
//!     ├── validate input, check customer and registered discounts
//!     ├── compute totals (line totals, order discounts, tax, apportioned
//!     │   share of the total per item)
//!     ├── INSERT order (pending)
//!     │
//!     ├── for each line:
//!     │     product active?
//!     │     plan FEFO/FIFO deduction over live entries ── short ──► InsufficientStock
//!     │     INSERT order item (cost = Σ units × entry cost)
//!     │     one OUT movement per drawn entry, referencing the item
//!     │
//!     └── commit: all lines or none
//! ```
//!
//! Stock is reserved at creation. A pending order that is cancelled gets
//! its units back through compensating IN movements against the same
//! entries; once an order has moved past pending, units only come back
//! through refunds.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::Action;
use crate::engine::TenantSession;
use crate::error::{EngineError, EngineResult};
use crate::movements::{post, Posting};
use tally_core::allocation::{plan_deduction, plan_reversal};
use tally_core::lifecycle::{ensure_transition, payment_status};
use tally_core::pricing::compute_totals;
use tally_core::validation::{validate_id, validate_new_order};
use tally_core::{
    Money, MovementReason, MovementType, NewOrder, Order, OrderDiscount, OrderItem, OrderPayment,
    OrderStatus, ValidationError,
};
use tally_db::TenantTx;

/// An order with everything recorded against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub discounts: Vec<OrderDiscount>,
    pub payments: Vec<OrderPayment>,
}

impl TenantSession {
    /// Creates a pending order and deducts its stock in one transaction.
    ///
    /// Fails with `InsufficientStock` if any line cannot be covered by the
    /// product's live entries; nothing is written in that case.
    pub async fn create_order(&self, input: NewOrder) -> EngineResult<OrderDetails> {
        self.authorize(Action::CreateOrder)?;
        validate_new_order(&input)?;

        let input = &input;
        let details = self
            .retrying("create_order", move || self.create_order_once(input))
            .await?;

        info!(
            order_id = %details.order.id,
            items = details.items.len(),
            total_cents = details.order.total_cents,
            "Order created"
        );
        Ok(details)
    }

    async fn create_order_once(&self, input: &NewOrder) -> EngineResult<OrderDetails> {
        let now = self.now();
        let mut tx = self.begin().await?;

        if let Some(customer_id) = &input.customer_id {
            tx.customers().get(customer_id).await?;
        }
        for discount_id in input.discounts.iter().filter_map(|d| d.discount_id.as_deref()) {
            let discount = tx.discounts().get(discount_id).await?;
            if !discount.is_valid_at(now) {
                return Err(ValidationError::unusable(
                    "discount_id",
                    discount_id,
                    "discount is inactive or outside its validity window",
                )
                .into());
            }
        }

        let totals = compute_totals(&input.items, &input.discounts, input.tax_cents);
        let order = Order {
            id: Uuid::new_v4().to_string(),
            business_id: self.business_id().to_string(),
            customer_id: input.customer_id.clone(),
            created_by: self.user_id().to_string(),
            status: OrderStatus::Pending,
            payment_status: payment_status(Money::zero(), totals.total),
            subtotal_cents: totals.subtotal.cents(),
            discount_cents: totals.discount_total.cents(),
            tax_cents: totals.tax.cents(),
            total_cents: totals.total.cents(),
            refunded_cents: 0,
            paid_cents: 0,
            notes: input.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        tx.orders().insert(&order).await?;

        let mut items = Vec::with_capacity(input.items.len());
        for (index, (line, line_totals)) in input.items.iter().zip(&totals.lines).enumerate() {
            let product = tx.products().get(&line.product_id).await?;
            if !product.is_active {
                return Err(ValidationError::unusable("product_id", &product.id, "product is inactive").into());
            }

            let candidates = tx.entries().candidates(&line.product_id).await?;
            let plan = plan_deduction(&line.product_id, line.quantity, &candidates)?;

            let item = OrderItem {
                id: Uuid::new_v4().to_string(),
                business_id: self.business_id().to_string(),
                order_id: order.id.clone(),
                line_no: index as i64 + 1,
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                discount_cents: line_totals.discount.cents(),
                total_cents: line_totals.total.cents(),
                allocated_cents: line_totals.allocated.cents(),
                cost_cents: plan.iter().map(|a| a.cost()).sum::<Money>().cents(),
                refunded_quantity: 0,
                refunded_cents: 0,
                created_at: now,
            };
            tx.orders().insert_item(&item).await?;

            for allocation in &plan {
                post(
                    &mut tx,
                    Posting {
                        entry_id: &allocation.entry_id,
                        quantity: allocation.quantity,
                        movement_type: MovementType::Out,
                        reason: MovementReason::Sale,
                        reference_id: Some(item.id.as_str()),
                        note: None,
                    },
                    self.user_id(),
                    now,
                )
                .await?;
            }

            debug!(
                order_id = %order.id,
                line_no = item.line_no,
                entries = plan.len(),
                quantity = item.quantity,
                "Order line allocated"
            );
            items.push(item);
        }

        let mut discounts = Vec::with_capacity(input.discounts.len());
        for (discount, amount) in input.discounts.iter().zip(&totals.order_discounts) {
            let row = OrderDiscount {
                id: Uuid::new_v4().to_string(),
                business_id: self.business_id().to_string(),
                order_id: order.id.clone(),
                discount_id: discount.discount_id.clone(),
                kind: discount.kind,
                value: discount.value,
                amount_cents: amount.cents(),
            };
            tx.orders().insert_discount(&row).await?;
            discounts.push(row);
        }

        tx.commit().await?;

        Ok(OrderDetails {
            order,
            items,
            discounts,
            payments: Vec::new(),
        })
    }

    /// Moves an order along the state graph. Moving to `Cancelled` cancels
    /// the order.
    pub async fn advance(&self, order_id: &str, to: OrderStatus) -> EngineResult<Order> {
        if to == OrderStatus::Cancelled {
            return self.cancel(order_id).await;
        }

        self.authorize(Action::AdvanceOrder)?;
        validate_id("order_id", order_id)?;

        let order = self
            .retrying("advance", move || async move {
                let mut tx = self.begin().await?;
                let order = tx.orders().get(order_id).await?;
                ensure_transition(order_id, order.status, to)?;

                tx.orders().set_status(order_id, order.status, to, self.now()).await?;
                let updated = tx.orders().get(order_id).await?;
                tx.commit().await?;
                Ok(updated)
            })
            .await?;

        info!(order_id = %order_id, status = ?order.status, "Order advanced");
        Ok(order)
    }

    /// Cancels a pending order and returns its units to the entries they
    /// were drawn from.
    ///
    /// Orders past pending fail with `InvalidStateTransition`. A pending
    /// order that already has payments recorded is rejected; advance it
    /// and refund instead.
    pub async fn cancel(&self, order_id: &str) -> EngineResult<Order> {
        self.authorize(Action::CancelOrder)?;
        validate_id("order_id", order_id)?;

        let order = self
            .retrying("cancel", move || async move {
                let mut tx = self.begin().await?;
                let order = tx.orders().get(order_id).await?;
                ensure_transition(order_id, order.status, OrderStatus::Cancelled)?;
                if order.paid_cents > 0 {
                    return Err(ValidationError::unusable(
                        "order",
                        order_id,
                        "payments recorded; advance and refund instead",
                    )
                    .into());
                }

                let items = tx.orders().items(order_id).await?;
                for item in &items {
                    self.return_item_stock(&mut tx, item).await?;
                }

                tx.orders()
                    .set_status(order_id, order.status, OrderStatus::Cancelled, self.now())
                    .await?;
                let cancelled = tx.orders().get(order_id).await?;
                tx.commit().await?;
                Ok(cancelled)
            })
            .await?;

        info!(order_id = %order_id, "Order cancelled");
        Ok(order)
    }

    /// Order with items, applied discounts and payments.
    pub async fn get_order(&self, order_id: &str) -> EngineResult<OrderDetails> {
        self.authorize(Action::ViewOrders)?;
        validate_id("order_id", order_id)?;

        let mut tx = self.begin().await?;
        let order = tx.orders().get(order_id).await?;
        let items = tx.orders().items(order_id).await?;
        let discounts = tx.orders().discounts(order_id).await?;
        let payments = tx.payments().for_order(order_id).await?;
        tx.commit().await?;

        Ok(OrderDetails {
            order,
            items,
            discounts,
            payments,
        })
    }

    async fn return_item_stock(&self, tx: &mut TenantTx, item: &OrderItem) -> EngineResult<()> {
        let slices = tx.movements().drawn_slices(&item.id).await?;
        let plan = plan_reversal(&item.product_id, item.refundable_quantity(), &slices)
            .map_err(EngineError::from)?;

        for (entry_id, quantity) in &plan {
            post(
                tx,
                Posting {
                    entry_id,
                    quantity: *quantity,
                    movement_type: MovementType::In,
                    reason: MovementReason::SaleCancelled,
                    reference_id: Some(item.id.as_str()),
                    note: None,
                },
                self.user_id(),
                self.now(),
            )
            .await?;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
