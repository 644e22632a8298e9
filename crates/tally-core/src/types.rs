//! # Domain Types
//!
//! Records owned by the inventory ledger and fulfillment engine, plus the
//! input shapes the engine accepts.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Business (tenant boundary)                                             │
//! │     │                                                                   │
//! │     ├── Product ◄──────────────┐                                        │
//! │     │                          │                                        │
//! │     ├── Batch ──► InventoryEntry ──► InventoryMovement (append-only)    │
//! │     │                   ▲                    │ reference_id             │
//! │     │                   │                    ▼                          │
//! │     ├── Order ──► OrderItem ◄───────── RefundItem ◄── Refund            │
//! │     │     ├──► OrderDiscount                                            │
//! │     │     └──► OrderPayment                                             │
//! │     └── Discount, Supplier, Customer                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every record carries `business_id`. Amounts are stored as `*_cents`
//! integers with `Money` accessors, matching the database columns.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tenant and Catalogue
// =============================================================================

/// Tenant boundary. All other records belong to exactly one business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Business {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A supplier that batches are received from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub contact: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A customer orders can be attributed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub email: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A catalogue item.
///
/// `quantity` is a cache of the live quantity summed over the product's
/// entries. It is updated in the same transaction as every movement and can
/// be rebuilt from entries at any time; it is never the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub business_id: String,
    pub sku: String,
    pub name: String,
    /// Quantity at or below which the product should be reordered.
    pub reorder_threshold: i64,
    /// Cached live quantity across all entries.
    pub quantity: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether the cached quantity has fallen to the reorder threshold.
    pub fn needs_reorder(&self) -> bool {
        self.quantity <= self.reorder_threshold
    }
}

// =============================================================================
// Batches and Entries
// =============================================================================

/// Lifecycle of a received shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Accepts further receiving.
    Open,
    /// No further receiving. Remaining stock can still be sold.
    Closed,
}

/// A shipment received from one supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Batch {
    pub id: String,
    pub business_id: String,
    pub supplier_id: String,
    /// Supplier's delivery note / invoice number.
    pub reference: Option<String>,
    pub status: BatchStatus,
    pub created_by: String,
    #[ts(as = "String")]
    pub received_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

/// One priced product line within a batch; the unit of FEFO/FIFO allocation.
///
/// `quantity_on_hand` always equals `quantity_received` plus the signed sum
/// of the entry's movements. [`InventoryEntry::live_from_movements`] is the
/// audit form of that rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryEntry {
    pub id: String,
    /// Creation order within the database; final FEFO/FIFO tie-break.
    pub seq: i64,
    pub business_id: String,
    pub batch_id: String,
    pub product_id: String,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub quantity_received: i64,
    pub quantity_on_hand: i64,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
    #[ts(as = "String")]
    pub received_at: DateTime<Utc>,
    /// Bumped on every quantity change (optimistic check).
    pub version: i64,
}

impl InventoryEntry {
    /// Returns the cost price as Money.
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    /// Returns the selling price as Money.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Recomputes the live quantity from the received quantity and a
    /// sequence of movements.
    pub fn live_from_movements<'a>(
        &self,
        movements: impl IntoIterator<Item = &'a InventoryMovement>,
    ) -> i64 {
        self.quantity_received + movements.into_iter().map(|m| m.quantity).sum::<i64>()
    }

    /// Whether the entry is past its expiry date on `day`.
    pub fn is_expired_on(&self, day: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry < day)
    }
}

// =============================================================================
// Movements
// =============================================================================

/// Kind of quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    /// Stock returned to an entry (cancellation, refund).
    In,
    /// Stock drawn from an entry (sale).
    Out,
    /// Manual correction, either sign.
    Adjustment,
}

impl MovementType {
    /// Converts a requested quantity into the signed quantity stored on the
    /// movement. `In`/`Out` take a magnitude; `Adjustment` keeps its sign.
    pub fn signed(&self, quantity: i64) -> i64 {
        match self {
            MovementType::In => quantity.abs(),
            MovementType::Out => -quantity.abs(),
            MovementType::Adjustment => quantity,
        }
    }
}

/// Why a movement was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementReason {
    /// Deduction for an order item.
    Sale,
    /// Compensation for a cancelled pending order.
    SaleCancelled,
    /// Compensation for refunded units.
    Refund,
    /// Manual stock correction.
    Adjustment,
}

/// Immutable record of one quantity change against one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryMovement {
    /// Insertion order; history is replayed by this column.
    pub sequence: i64,
    pub id: String,
    pub business_id: String,
    pub entry_id: String,
    pub product_id: String,
    pub movement_type: MovementType,
    /// Signed: negative for `Out`, positive for `In`.
    pub quantity: i64,
    pub reason: MovementReason,
    /// Order item id for sale/cancel/refund movements.
    pub reference_id: Option<String>,
    pub note: Option<String>,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Orders
// =============================================================================

/// Fulfillment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

/// Payment status, derived from payments against the effective total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Unpaid
    }
}

/// A customer transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub business_id: String,
    pub customer_id: Option<String>,
    pub created_by: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Σ unit_price × quantity, before any discount.
    pub subtotal_cents: i64,
    /// Item discounts plus order-level discounts, capped at subtotal.
    pub discount_cents: i64,
    pub tax_cents: i64,
    /// subtotal − discount + tax.
    pub total_cents: i64,
    /// Σ processed refund amounts.
    pub refunded_cents: i64,
    /// Σ payments (cache of order_payments).
    pub paid_cents: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn paid(&self) -> Money {
        Money::from_cents(self.paid_cents)
    }

    #[inline]
    pub fn refunded(&self) -> Money {
        Money::from_cents(self.refunded_cents)
    }

    /// Total still owed for goods kept: total − refunded.
    #[inline]
    pub fn effective_total(&self) -> Money {
        self.total() - self.refunded()
    }
}

/// A line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub business_id: String,
    pub order_id: String,
    /// 1-based position within the order.
    pub line_no: i64,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// Line-level discount (already capped at the line subtotal).
    pub discount_cents: i64,
    /// unit_price × quantity − discount.
    pub total_cents: i64,
    /// Share of the order total (after order discounts and tax) carried by
    /// this line. Refund amounts are computed from it.
    pub allocated_cents: i64,
    /// Σ allocated units × entry cost price.
    pub cost_cents: i64,
    pub refunded_quantity: i64,
    pub refunded_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn allocated(&self) -> Money {
        Money::from_cents(self.allocated_cents)
    }

    /// Units not yet refunded.
    #[inline]
    pub fn refundable_quantity(&self) -> i64 {
        self.quantity - self.refunded_quantity
    }
}

/// A discount applied to an order, resolved to a concrete amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderDiscount {
    pub id: String,
    pub business_id: String,
    pub order_id: String,
    pub discount_id: Option<String>,
    pub kind: DiscountKind,
    /// Basis points for percentage, cents for fixed.
    pub value: i64,
    pub amount_cents: i64,
}

// =============================================================================
// Discounts
// =============================================================================

/// How a discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// Value in basis points of the pre-discount subtotal.
    Percentage,
    /// Value in cents, capped at the subtotal.
    Fixed,
}

/// Which products a discount targets. Eligibility is decided upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountScope {
    All,
    Selected,
}

/// A registered discount with a validity window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Discount {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub kind: DiscountKind,
    pub value: i64,
    pub scope: DiscountScope,
    #[ts(as = "String")]
    pub starts_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Discount {
    /// Whether the discount can be applied at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.starts_at <= now && self.ends_at.map_or(true, |end| now <= end)
    }
}

// =============================================================================
// Payments
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    MobileMoney,
    Other,
}

/// One payment fact applied to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderPayment {
    pub id: String,
    pub business_id: String,
    pub order_id: String,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    /// External reference (card auth code, transfer id, ...).
    pub reference: Option<String>,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderPayment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Refunds
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RefundType {
    /// Every remaining unrefunded unit of every item.
    Full,
    /// Only the listed items and quantities.
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Processed,
    Failed,
}

/// A reversal against an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Refund {
    pub id: String,
    pub business_id: String,
    pub order_id: String,
    pub refund_type: RefundType,
    pub status: RefundStatus,
    pub amount_cents: i64,
    pub reason: Option<String>,
    /// Storage error text when `status` is `Failed`.
    pub failure_reason: Option<String>,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Refund {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Units of one order item returned by a refund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RefundItem {
    pub id: String,
    pub business_id: String,
    pub refund_id: String,
    pub order_item_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub amount_cents: i64,
}

// =============================================================================
// Inputs
// =============================================================================

/// A product line to receive into a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewEntry {
    pub product_id: String,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub quantity: i64,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
}

/// A shipment to receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewBatch {
    pub supplier_id: String,
    pub reference: Option<String>,
}

/// A requested order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLineInput {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// Pre-resolved line discount in cents.
    #[serde(default)]
    pub discount_cents: i64,
}

/// A pre-resolved order-level discount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountInput {
    /// Registered discount this line came from, if any.
    pub discount_id: Option<String>,
    pub kind: DiscountKind,
    /// Basis points for percentage, cents for fixed.
    pub value: i64,
}

/// Everything needed to create an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOrder {
    pub customer_id: Option<String>,
    pub items: Vec<OrderLineInput>,
    #[serde(default)]
    pub discounts: Vec<DiscountInput>,
    /// Pre-resolved tax amount in cents.
    #[serde(default)]
    pub tax_cents: i64,
    pub notes: Option<String>,
}

/// One line of a refund request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RefundLineInput {
    pub order_item_id: String,
    pub quantity: i64,
}

/// A refund request against an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RefundRequest {
    pub refund_type: RefundType,
    /// Ignored for `Full`; required for `Partial`.
    #[serde(default)]
    pub items: Vec<RefundLineInput>,
    pub reason: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(received: i64, on_hand: i64) -> InventoryEntry {
        InventoryEntry {
            id: "E1".to_string(),
            seq: 1,
            business_id: "B1".to_string(),
            batch_id: "BA1".to_string(),
            product_id: "P1".to_string(),
            cost_price_cents: 250,
            selling_price_cents: 400,
            quantity_received: received,
            quantity_on_hand: on_hand,
            expiry_date: NaiveDate::from_ymd_opt(2026, 3, 1),
            received_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            version: 0,
        }
    }

    fn movement(quantity: i64, movement_type: MovementType) -> InventoryMovement {
        InventoryMovement {
            sequence: 1,
            id: "M1".to_string(),
            business_id: "B1".to_string(),
            entry_id: "E1".to_string(),
            product_id: "P1".to_string(),
            movement_type,
            quantity,
            reason: MovementReason::Sale,
            reference_id: None,
            note: None,
            created_by: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_movement_type_signing() {
        assert_eq!(MovementType::Out.signed(30), -30);
        assert_eq!(MovementType::Out.signed(-30), -30);
        assert_eq!(MovementType::In.signed(5), 5);
        assert_eq!(MovementType::Adjustment.signed(-4), -4);
    }

    #[test]
    fn test_live_from_movements() {
        let e = entry(100, 72);
        let movements = vec![
            movement(-30, MovementType::Out),
            movement(2, MovementType::In),
        ];
        assert_eq!(e.live_from_movements(&movements), 72);
    }

    #[test]
    fn test_entry_expiry() {
        let e = entry(10, 10);
        assert!(!e.is_expired_on(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()));
        assert!(e.is_expired_on(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()));
    }

    #[test]
    fn test_discount_window() {
        let discount = Discount {
            id: "D1".to_string(),
            business_id: "B1".to_string(),
            name: "Spring".to_string(),
            kind: DiscountKind::Percentage,
            value: 1000,
            scope: DiscountScope::All,
            starts_at: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            ends_at: Some(Utc.with_ymd_and_hms(2026, 3, 31, 23, 59, 59).unwrap()),
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
        };
        assert!(discount.is_valid_at(Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap()));
        assert!(!discount.is_valid_at(Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()));
        assert!(!discount.is_valid_at(Utc.with_ymd_and_hms(2026, 2, 28, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_status_defaults() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Unpaid);
    }

    #[test]
    fn test_movement_type_serializes_uppercase() {
        let json = serde_json::to_string(&MovementType::Adjustment).unwrap();
        assert_eq!(json, "\"ADJUSTMENT\"");
    }
}
