//! # Inventory Entry Repository
//!
//! Priced stock lines. `quantity_on_hand` only changes through
//! [`EntryRepository::apply_delta`], which the movement log calls in the same
//! transaction as the movement insert.
//!
//! ## Guarded Update
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE inventory_entries                                               │
//! │  SET quantity_on_hand = quantity_on_hand + δ, version = version + 1     │
//! │  WHERE id = ? AND business_id = ?                                       │
//! │    AND version = <version read>        ← optimistic check               │
//! │    AND quantity_on_hand + δ >= 0       ← never below zero               │
//! │                                                                         │
//! │  0 rows → DbError::Conflict (retryable)                                 │
//! │  CHECK (quantity_on_hand >= 0) backs this up at the schema level.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::scope::{require, Owned};
use tally_core::InventoryEntry;

const ENTRY_COLUMNS: &str = r#"
    seq, id, business_id, batch_id, product_id, cost_price_cents, selling_price_cents,
    quantity_received, quantity_on_hand, expiry_date, received_at, version
"#;

/// Inventory entries of one business.
pub struct EntryRepository<'t> {
    conn: &'t mut SqliteConnection,
    business_id: &'t str,
}

impl<'t> EntryRepository<'t> {
    pub(crate) fn new(conn: &'t mut SqliteConnection, business_id: &'t str) -> Self {
        EntryRepository { conn, business_id }
    }

    /// Inserts an entry and returns it with its assigned `seq`.
    pub async fn insert(&mut self, entry: &InventoryEntry) -> DbResult<InventoryEntry> {
        debug!(
            id = %entry.id,
            batch_id = %entry.batch_id,
            product_id = %entry.product_id,
            quantity = entry.quantity_received,
            "Inserting inventory entry"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO inventory_entries (
                id, business_id, batch_id, product_id, cost_price_cents, selling_price_cents,
                quantity_received, quantity_on_hand, expiry_date, received_at, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&entry.id)
        .bind(self.business_id)
        .bind(&entry.batch_id)
        .bind(&entry.product_id)
        .bind(entry.cost_price_cents)
        .bind(entry.selling_price_cents)
        .bind(entry.quantity_received)
        .bind(entry.quantity_on_hand)
        .bind(entry.expiry_date)
        .bind(entry.received_at)
        .bind(entry.version)
        .execute(&mut *self.conn)
        .await?;

        Ok(InventoryEntry {
            seq: result.last_insert_rowid(),
            business_id: self.business_id.to_string(),
            ..entry.clone()
        })
    }

    /// Gets an entry by ID.
    pub async fn get(&mut self, id: &str) -> DbResult<InventoryEntry> {
        let sql = format!(
            "SELECT {} FROM inventory_entries WHERE id = ?1 AND business_id = ?2",
            ENTRY_COLUMNS
        );
        let found = sqlx::query_as::<_, InventoryEntry>(&sql)
            .bind(id)
            .bind(self.business_id)
            .fetch_optional(&mut *self.conn)
            .await?;

        require(found, &mut *self.conn, Owned::Entry, id, self.business_id).await
    }

    /// Entries of a product that still hold stock, in FEFO/FIFO order.
    pub async fn candidates(&mut self, product_id: &str) -> DbResult<Vec<InventoryEntry>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM inventory_entries
            WHERE business_id = ?1 AND product_id = ?2 AND quantity_on_hand > 0
            ORDER BY expiry_date IS NULL, expiry_date ASC, received_at ASC, seq ASC
            "#,
            ENTRY_COLUMNS
        );
        let rows = sqlx::query_as::<_, InventoryEntry>(&sql)
            .bind(self.business_id)
            .bind(product_id)
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows)
    }

    /// Every entry of a product, including empty ones, in creation order.
    pub async fn for_product(&mut self, product_id: &str) -> DbResult<Vec<InventoryEntry>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM inventory_entries
            WHERE business_id = ?1 AND product_id = ?2
            ORDER BY seq ASC
            "#,
            ENTRY_COLUMNS
        );
        let rows = sqlx::query_as::<_, InventoryEntry>(&sql)
            .bind(self.business_id)
            .bind(product_id)
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows)
    }

    /// Entries received in a batch, in creation order.
    pub async fn for_batch(&mut self, batch_id: &str) -> DbResult<Vec<InventoryEntry>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM inventory_entries
            WHERE business_id = ?1 AND batch_id = ?2
            ORDER BY seq ASC
            "#,
            ENTRY_COLUMNS
        );
        let rows = sqlx::query_as::<_, InventoryEntry>(&sql)
            .bind(self.business_id)
            .bind(batch_id)
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows)
    }

    /// Applies a signed quantity change to an entry read earlier in the same
    /// transaction and returns the new live quantity.
    ///
    /// Fails with `Conflict` when the entry changed since it was read or the
    /// change would take it below zero.
    pub async fn apply_delta(&mut self, entry: &InventoryEntry, delta: i64) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_entries
            SET quantity_on_hand = quantity_on_hand + ?1, version = version + 1
            WHERE id = ?2 AND business_id = ?3 AND version = ?4
              AND quantity_on_hand + ?1 >= 0
            "#,
        )
        .bind(delta)
        .bind(&entry.id)
        .bind(self.business_id)
        .bind(entry.version)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            debug!(id = %entry.id, version = entry.version, delta = delta, "Guarded entry update missed");
            return Err(DbError::conflict(Owned::Entry.entity(), &entry.id));
        }

        Ok(entry.quantity_on_hand + delta)
    }
}
