//! # Refund Repository
//!
//! Refund records and the order items they return. Failed refunds are
//! stored too, with no items.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use crate::scope::{require, Owned};
use tally_core::{Refund, RefundItem};

const REFUND_COLUMNS: &str = r#"
    id, business_id, order_id, refund_type, status, amount_cents,
    reason, failure_reason, created_by, created_at
"#;

/// Refunds of one business.
pub struct RefundRepository<'t> {
    conn: &'t mut SqliteConnection,
    business_id: &'t str,
}

impl<'t> RefundRepository<'t> {
    pub(crate) fn new(conn: &'t mut SqliteConnection, business_id: &'t str) -> Self {
        RefundRepository { conn, business_id }
    }

    pub async fn insert(&mut self, refund: &Refund) -> DbResult<()> {
        debug!(
            id = %refund.id,
            order_id = %refund.order_id,
            status = ?refund.status,
            amount_cents = refund.amount_cents,
            "Inserting refund"
        );

        sqlx::query(
            r#"
            INSERT INTO refunds (
                id, business_id, order_id, refund_type, status, amount_cents,
                reason, failure_reason, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&refund.id)
        .bind(self.business_id)
        .bind(&refund.order_id)
        .bind(refund.refund_type)
        .bind(refund.status)
        .bind(refund.amount_cents)
        .bind(&refund.reason)
        .bind(&refund.failure_reason)
        .bind(&refund.created_by)
        .bind(refund.created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn insert_item(&mut self, item: &RefundItem) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refund_items (
                id, business_id, refund_id, order_item_id, product_id, quantity, amount_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&item.id)
        .bind(self.business_id)
        .bind(&item.refund_id)
        .bind(&item.order_item_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.amount_cents)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn get(&mut self, id: &str) -> DbResult<Refund> {
        let sql = format!(
            "SELECT {} FROM refunds WHERE id = ?1 AND business_id = ?2",
            REFUND_COLUMNS
        );
        let found = sqlx::query_as::<_, Refund>(&sql)
            .bind(id)
            .bind(self.business_id)
            .fetch_optional(&mut *self.conn)
            .await?;

        require(found, &mut *self.conn, Owned::Refund, id, self.business_id).await
    }

    /// Refunds of an order, oldest first, failed ones included.
    pub async fn for_order(&mut self, order_id: &str) -> DbResult<Vec<Refund>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM refunds
            WHERE order_id = ?1 AND business_id = ?2
            ORDER BY created_at ASC, rowid ASC
            "#,
            REFUND_COLUMNS
        );
        let rows = sqlx::query_as::<_, Refund>(&sql)
            .bind(order_id)
            .bind(self.business_id)
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows)
    }

    pub async fn items(&mut self, refund_id: &str) -> DbResult<Vec<RefundItem>> {
        let rows = sqlx::query_as::<_, RefundItem>(
            r#"
            SELECT id, business_id, refund_id, order_item_id, product_id, quantity, amount_cents
            FROM refund_items
            WHERE refund_id = ?1 AND business_id = ?2
            ORDER BY rowid ASC
            "#,
        )
        .bind(refund_id)
        .bind(self.business_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows)
    }
}
