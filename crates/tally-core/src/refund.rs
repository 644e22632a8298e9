//! # Refund Lines
//!
//! Resolves a refund request against an order's items: which units come
//! back and what they are worth.
//!
//! A line is worth its share of the item's allocated amount:
//! `allocated × qty / quantity`, rounded half-up. Refunding the last units
//! of an item takes exactly what is left of its allocated amount, so a
//! series of partial refunds always sums to the item's allocated amount and
//! a full refund returns the order total.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{OrderItem, RefundRequest, RefundType};

/// One resolved line of a refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RefundLine {
    pub order_item_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub amount: Money,
}

/// Value of refunding `quantity` units of `item`.
pub fn line_amount(item: &OrderItem, quantity: i64) -> Money {
    let unrefunded = (item.allocated() - Money::from_cents(item.refunded_cents)).non_negative();
    if quantity >= item.refundable_quantity() {
        return unrefunded;
    }
    item.allocated().scale(quantity, item.quantity).min(unrefunded)
}

/// Resolves `request` against the order's `items`.
///
/// `Full` takes every unrefunded unit. `Partial` takes the listed lines,
/// each of which must belong to the order and stay within its refundable
/// quantity. Lines are checked in request order and come back in order-item
/// order.
pub fn resolve_lines(order_id: &str, request: &RefundRequest, items: &[OrderItem]) -> CoreResult<Vec<RefundLine>> {
    let mut lines = Vec::new();

    match request.refund_type {
        RefundType::Full => {
            for item in items.iter().filter(|i| i.refundable_quantity() > 0) {
                let quantity = item.refundable_quantity();
                lines.push(RefundLine {
                    order_item_id: item.id.clone(),
                    product_id: item.product_id.clone(),
                    quantity,
                    amount: line_amount(item, quantity),
                });
            }
        }
        RefundType::Partial => {
            // Checked in request order so the error names the first bad line
            let mut resolved = Vec::with_capacity(request.items.len());
            for requested in &request.items {
                let Some(position) = items.iter().position(|i| i.id == requested.order_item_id) else {
                    return Err(ValidationError::unusable(
                        "order_item_id",
                        requested.order_item_id.clone(),
                        format!("not an item of order {}", order_id),
                    )
                    .into());
                };
                let item = &items[position];
                if requested.quantity > item.refundable_quantity() {
                    return Err(CoreError::RefundExceedsOriginal {
                        order_item_id: item.id.clone(),
                        requested: requested.quantity,
                        refundable: item.refundable_quantity(),
                    });
                }
                resolved.push((
                    position,
                    RefundLine {
                        order_item_id: item.id.clone(),
                        product_id: item.product_id.clone(),
                        quantity: requested.quantity,
                        amount: line_amount(item, requested.quantity),
                    },
                ));
            }

            resolved.sort_by_key(|(position, _)| *position);
            lines.extend(resolved.into_iter().map(|(_, line)| line));
        }
    }

    if lines.is_empty() {
        return Err(ValidationError::unusable("order", order_id, "nothing left to refund").into());
    }

    Ok(lines)
}

/// Sum of the line amounts.
pub fn refund_total(lines: &[RefundLine]) -> Money {
    lines.iter().map(|l| l.amount).sum()
}

// =============================================================================
// Unit Tests
// =============================================================================
