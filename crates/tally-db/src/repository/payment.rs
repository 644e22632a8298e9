//! # Payment Repository
//!
//! Payment facts. One row per applied payment; the order row carries the
//! running sum.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use tally_core::OrderPayment;

/// Payments of one business.
pub struct PaymentRepository<'t> {
    conn: &'t mut SqliteConnection,
    business_id: &'t str,
}

impl<'t> PaymentRepository<'t> {
    pub(crate) fn new(conn: &'t mut SqliteConnection, business_id: &'t str) -> Self {
        PaymentRepository { conn, business_id }
    }

    pub async fn insert(&mut self, payment: &OrderPayment) -> DbResult<()> {
        debug!(
            id = %payment.id,
            order_id = %payment.order_id,
            amount_cents = payment.amount_cents,
            method = ?payment.method,
            "Inserting payment"
        );

        sqlx::query(
            r#"
            INSERT INTO order_payments (
                id, business_id, order_id, amount_cents, method, reference, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&payment.id)
        .bind(self.business_id)
        .bind(&payment.order_id)
        .bind(payment.amount_cents)
        .bind(payment.method)
        .bind(&payment.reference)
        .bind(&payment.created_by)
        .bind(payment.created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Payments applied to an order, oldest first.
    pub async fn for_order(&mut self, order_id: &str) -> DbResult<Vec<OrderPayment>> {
        let rows = sqlx::query_as::<_, OrderPayment>(
            r#"
            SELECT id, business_id, order_id, amount_cents, method, reference, created_by, created_at
            FROM order_payments
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

    /// Sum of payments applied to an order.
    pub async fn total_for_order(&mut self, order_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0)
            FROM order_payments
            WHERE order_id = ?1 AND business_id = ?2
            "#,
        )
        .bind(order_id)
        .bind(self.business_id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(total)
    }
}
