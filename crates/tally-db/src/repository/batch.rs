//! # Batch Repository
//!
//! Received shipments. A batch is never deleted; closing it stops further
//! receiving into it while its entries keep selling down.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use crate::scope::{miss, require, Owned};
use tally_core::{Batch, BatchStatus};

/// Batch records of one business.
pub struct BatchRepository<'t> {
    conn: &'t mut SqliteConnection,
    business_id: &'t str,
}

impl<'t> BatchRepository<'t> {
    pub(crate) fn new(conn: &'t mut SqliteConnection, business_id: &'t str) -> Self {
        BatchRepository { conn, business_id }
    }

    pub async fn insert(&mut self, batch: &Batch) -> DbResult<()> {
        debug!(id = %batch.id, supplier_id = %batch.supplier_id, "Inserting batch");

        sqlx::query(
            r#"
            INSERT INTO batches (
                id, business_id, supplier_id, reference, status,
                created_by, received_at, closed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&batch.id)
        .bind(self.business_id)
        .bind(&batch.supplier_id)
        .bind(&batch.reference)
        .bind(batch.status)
        .bind(&batch.created_by)
        .bind(batch.received_at)
        .bind(batch.closed_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn get(&mut self, id: &str) -> DbResult<Batch> {
        let found = sqlx::query_as::<_, Batch>(
            r#"
            SELECT id, business_id, supplier_id, reference, status,
                   created_by, received_at, closed_at
            FROM batches
            WHERE id = ?1 AND business_id = ?2
            "#,
        )
        .bind(id)
        .bind(self.business_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        require(found, &mut *self.conn, Owned::Batch, id, self.business_id).await
    }

    /// Marks the batch closed. Closing an already closed batch keeps the
    /// original `closed_at`.
    pub async fn close(&mut self, id: &str, now: DateTime<Utc>) -> DbResult<()> {
        debug!(id = %id, "Closing batch");

        let result = sqlx::query(
            r#"
            UPDATE batches
            SET status = ?1, closed_at = COALESCE(closed_at, ?2)
            WHERE id = ?3 AND business_id = ?4
            "#,
        )
        .bind(BatchStatus::Closed)
        .bind(now)
        .bind(id)
        .bind(self.business_id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(miss(&mut *self.conn, Owned::Batch, id, self.business_id).await);
        }
        Ok(())
    }
}
