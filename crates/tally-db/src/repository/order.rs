//! # Order Repository
//!
//! Orders, their items and their applied discounts.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. CREATE                                                              │
//! │     └── insert() + insert_item() per line + insert_discount()           │
//! │         (stock already drawn by the movement log, same transaction)     │
//! │                                                                         │
//! │  2. PAY                                                                 │
//! │     └── set_paid(expected paid) → paid_cents, payment_status            │
//! │                                                                         │
//! │  3. ADVANCE / CANCEL                                                    │
//! │     └── set_status(expected status)                                     │
//! │                                                                         │
//! │  4. REFUND                                                              │
//! │     └── add_item_refund() per line + set_refunded(expected refunded)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every update names the value it expects to replace; a mismatch means a
//! concurrent writer got there first and fails with `Conflict`.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::scope::{miss, require, Owned};
use tally_core::{Order, OrderDiscount, OrderItem, OrderStatus, PaymentStatus};

const ORDER_COLUMNS: &str = r#"
    id, business_id, customer_id, created_by, status, payment_status,
    subtotal_cents, discount_cents, tax_cents, total_cents, refunded_cents, paid_cents,
    notes, created_at, updated_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, business_id, order_id, line_no, product_id, quantity, unit_price_cents,
    discount_cents, total_cents, allocated_cents, cost_cents,
    refunded_quantity, refunded_cents, created_at
"#;

/// Orders of one business.
pub struct OrderRepository<'t> {
    conn: &'t mut SqliteConnection,
    business_id: &'t str,
}

impl<'t> OrderRepository<'t> {
    pub(crate) fn new(conn: &'t mut SqliteConnection, business_id: &'t str) -> Self {
        OrderRepository { conn, business_id }
    }

    // =========================================================================
    // Inserts
    // =========================================================================

    pub async fn insert(&mut self, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, total_cents = order.total_cents, "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, business_id, customer_id, created_by, status, payment_status,
                subtotal_cents, discount_cents, tax_cents, total_cents,
                refunded_cents, paid_cents, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&order.id)
        .bind(self.business_id)
        .bind(&order.customer_id)
        .bind(&order.created_by)
        .bind(order.status)
        .bind(order.payment_status)
        .bind(order.subtotal_cents)
        .bind(order.discount_cents)
        .bind(order.tax_cents)
        .bind(order.total_cents)
        .bind(order.refunded_cents)
        .bind(order.paid_cents)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn insert_item(&mut self, item: &OrderItem) -> DbResult<()> {
        debug!(id = %item.id, order_id = %item.order_id, product_id = %item.product_id, "Inserting order item");

        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, business_id, order_id, line_no, product_id, quantity, unit_price_cents,
                discount_cents, total_cents, allocated_cents, cost_cents,
                refunded_quantity, refunded_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&item.id)
        .bind(self.business_id)
        .bind(&item.order_id)
        .bind(item.line_no)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.discount_cents)
        .bind(item.total_cents)
        .bind(item.allocated_cents)
        .bind(item.cost_cents)
        .bind(item.refunded_quantity)
        .bind(item.refunded_cents)
        .bind(item.created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn insert_discount(&mut self, discount: &OrderDiscount) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO order_discounts (
                id, business_id, order_id, discount_id, kind, value, amount_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&discount.id)
        .bind(self.business_id)
        .bind(&discount.order_id)
        .bind(&discount.discount_id)
        .bind(discount.kind)
        .bind(discount.value)
        .bind(discount.amount_cents)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get(&mut self, id: &str) -> DbResult<Order> {
        let sql = format!(
            "SELECT {} FROM orders WHERE id = ?1 AND business_id = ?2",
            ORDER_COLUMNS
        );
        let found = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(self.business_id)
            .fetch_optional(&mut *self.conn)
            .await?;

        require(found, &mut *self.conn, Owned::Order, id, self.business_id).await
    }

    /// Items of an order, by line number.
    pub async fn items(&mut self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM order_items
            WHERE order_id = ?1 AND business_id = ?2
            ORDER BY line_no ASC
            "#,
            ITEM_COLUMNS
        );
        let rows = sqlx::query_as::<_, OrderItem>(&sql)
            .bind(order_id)
            .bind(self.business_id)
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows)
    }

    pub async fn get_item(&mut self, id: &str) -> DbResult<OrderItem> {
        let sql = format!(
            "SELECT {} FROM order_items WHERE id = ?1 AND business_id = ?2",
            ITEM_COLUMNS
        );
        let found = sqlx::query_as::<_, OrderItem>(&sql)
            .bind(id)
            .bind(self.business_id)
            .fetch_optional(&mut *self.conn)
            .await?;

        require(found, &mut *self.conn, Owned::OrderItem, id, self.business_id).await
    }

    pub async fn discounts(&mut self, order_id: &str) -> DbResult<Vec<OrderDiscount>> {
        let rows = sqlx::query_as::<_, OrderDiscount>(
            r#"
            SELECT id, business_id, order_id, discount_id, kind, value, amount_cents
            FROM order_discounts
            WHERE order_id = ?1 AND business_id = ?2
            ORDER BY rowid ASC
            "#,
        )
        .bind(order_id)
        .bind(self.business_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows)
    }

    // =========================================================================
    // Guarded Updates
    // =========================================================================

    /// Moves the order from `from` to `to`.
    pub async fn set_status(
        &mut self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id = %id, from = ?from, to = ?to, "Updating order status");

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = ?1, updated_at = ?2
            WHERE id = ?3 AND business_id = ?4 AND status = ?5
            "#,
        )
        .bind(to)
        .bind(now)
        .bind(id)
        .bind(self.business_id)
        .bind(from)
        .execute(&mut *self.conn)
        .await?;

        self.expect_one(result.rows_affected(), id).await
    }

    /// Records a new paid sum, replacing `expected_paid`.
    pub async fn set_paid(
        &mut self,
        id: &str,
        expected_paid: i64,
        paid_cents: i64,
        status: PaymentStatus,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET paid_cents = ?1, payment_status = ?2, updated_at = ?3
            WHERE id = ?4 AND business_id = ?5 AND paid_cents = ?6
            "#,
        )
        .bind(paid_cents)
        .bind(status)
        .bind(now)
        .bind(id)
        .bind(self.business_id)
        .bind(expected_paid)
        .execute(&mut *self.conn)
        .await?;

        self.expect_one(result.rows_affected(), id).await
    }

    /// Records a new refunded sum, replacing `expected_refunded`.
    pub async fn set_refunded(
        &mut self,
        id: &str,
        expected_refunded: i64,
        refunded_cents: i64,
        status: PaymentStatus,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET refunded_cents = ?1, payment_status = ?2, updated_at = ?3
            WHERE id = ?4 AND business_id = ?5 AND refunded_cents = ?6
            "#,
        )
        .bind(refunded_cents)
        .bind(status)
        .bind(now)
        .bind(id)
        .bind(self.business_id)
        .bind(expected_refunded)
        .execute(&mut *self.conn)
        .await?;

        self.expect_one(result.rows_affected(), id).await
    }

    /// Adds refunded units and amount to an item, replacing the refunded
    /// quantity read earlier.
    pub async fn add_item_refund(&mut self, item: &OrderItem, quantity: i64, amount_cents: i64) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE order_items
            SET refunded_quantity = refunded_quantity + ?1,
                refunded_cents = refunded_cents + ?2
            WHERE id = ?3 AND business_id = ?4 AND refunded_quantity = ?5
            "#,
        )
        .bind(quantity)
        .bind(amount_cents)
        .bind(&item.id)
        .bind(self.business_id)
        .bind(item.refunded_quantity)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict(Owned::OrderItem.entity(), &item.id));
        }
        Ok(())
    }

    async fn expect_one(&mut self, rows: u64, id: &str) -> DbResult<()> {
        if rows > 0 {
            return Ok(());
        }
        // The row is there, so the guard moved under us
        if self.exists(id).await? {
            return Err(DbError::conflict(Owned::Order.entity(), id));
        }
        Err(miss(&mut *self.conn, Owned::Order, id, self.business_id).await)
    }

    async fn exists(&mut self, id: &str) -> DbResult<bool> {
        let found: Option<String> =
            sqlx::query_scalar("SELECT id FROM orders WHERE id = ?1 AND business_id = ?2")
                .bind(id)
                .bind(self.business_id)
                .fetch_optional(&mut *self.conn)
                .await?;
        Ok(found.is_some())
    }
}
