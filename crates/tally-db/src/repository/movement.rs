//! # Movement Repository
//!
//! The append-only movement log. There is no update or delete here, and the
//! schema's triggers reject both.
//!
//! ## Reading Back
//! ```text
//! history:  page(entry_id, after = 0,  limit) → [#1 #2 #3]
//!           page(entry_id, after = #3, limit) → [#7 #9]
//!           page(entry_id, after = #9, limit) → []
//!
//! Keyed by `sequence`, so a page is stable no matter how many movements
//! other entries record in between.
//! ```

use sqlx::{FromRow, SqliteConnection};
use tracing::debug;

use crate::error::DbResult;
use tally_core::allocation::DrawnSlice;
use tally_core::InventoryMovement;

const MOVEMENT_COLUMNS: &str = r#"
    sequence, id, business_id, entry_id, product_id, movement_type, quantity,
    reason, reference_id, note, created_by, created_at
"#;

#[derive(Debug, FromRow)]
struct DrawnRow {
    entry_id: String,
    first_sequence: i64,
    outstanding: i64,
}

/// Movement log of one business.
pub struct MovementRepository<'t> {
    conn: &'t mut SqliteConnection,
    business_id: &'t str,
}

impl<'t> MovementRepository<'t> {
    pub(crate) fn new(conn: &'t mut SqliteConnection, business_id: &'t str) -> Self {
        MovementRepository { conn, business_id }
    }

    /// Appends a movement and returns it with its assigned `sequence`.
    pub async fn insert(&mut self, movement: &InventoryMovement) -> DbResult<InventoryMovement> {
        debug!(
            id = %movement.id,
            entry_id = %movement.entry_id,
            movement_type = ?movement.movement_type,
            quantity = movement.quantity,
            reason = ?movement.reason,
            "Appending movement"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO inventory_movements (
                id, business_id, entry_id, product_id, movement_type, quantity,
                reason, reference_id, note, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&movement.id)
        .bind(self.business_id)
        .bind(&movement.entry_id)
        .bind(&movement.product_id)
        .bind(movement.movement_type)
        .bind(movement.quantity)
        .bind(movement.reason)
        .bind(&movement.reference_id)
        .bind(&movement.note)
        .bind(&movement.created_by)
        .bind(movement.created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(InventoryMovement {
            sequence: result.last_insert_rowid(),
            business_id: self.business_id.to_string(),
            ..movement.clone()
        })
    }

    /// Up to `limit` movements of an entry with `sequence > after`, in
    /// insertion order.
    pub async fn page(&mut self, entry_id: &str, after: i64, limit: i64) -> DbResult<Vec<InventoryMovement>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM inventory_movements
            WHERE business_id = ?1 AND entry_id = ?2 AND sequence > ?3
            ORDER BY sequence ASC
            LIMIT ?4
            "#,
            MOVEMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, InventoryMovement>(&sql)
            .bind(self.business_id)
            .bind(entry_id)
            .bind(after)
            .bind(limit)
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows)
    }

    /// Signed sum of an entry's movements.
    pub async fn signed_sum(&mut self, entry_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(quantity), 0)
            FROM inventory_movements
            WHERE business_id = ?1 AND entry_id = ?2
            "#,
        )
        .bind(self.business_id)
        .bind(entry_id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(total)
    }

    /// Movements that reference an order item, in insertion order.
    pub async fn for_reference(&mut self, reference_id: &str) -> DbResult<Vec<InventoryMovement>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM inventory_movements
            WHERE business_id = ?1 AND reference_id = ?2
            ORDER BY sequence ASC
            "#,
            MOVEMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, InventoryMovement>(&sql)
            .bind(self.business_id)
            .bind(reference_id)
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows)
    }

    /// Per entry: units an order item drew and has not yet returned.
    pub async fn drawn_slices(&mut self, order_item_id: &str) -> DbResult<Vec<DrawnSlice>> {
        let rows = sqlx::query_as::<_, DrawnRow>(
            r#"
            SELECT entry_id,
                   COALESCE(MIN(CASE WHEN movement_type = 'OUT' THEN sequence END), 0) AS first_sequence,
                   -SUM(quantity) AS outstanding
            FROM inventory_movements
            WHERE business_id = ?1 AND reference_id = ?2
              AND reason IN ('sale', 'sale_cancelled', 'refund')
            GROUP BY entry_id
            ORDER BY first_sequence ASC
            "#,
        )
        .bind(self.business_id)
        .bind(order_item_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| DrawnSlice {
                entry_id: r.entry_id,
                first_sequence: r.first_sequence,
                outstanding: r.outstanding,
            })
            .collect())
    }
}
