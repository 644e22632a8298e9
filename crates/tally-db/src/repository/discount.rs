//! # Discount Repository
//!
//! Registered discounts. Orders reference them by id; the amount applied to
//! an order is resolved before the engine sees it.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use crate::scope::{require, Owned};
use tally_core::Discount;

/// Discount records of one business.
pub struct DiscountRepository<'t> {
    conn: &'t mut SqliteConnection,
    business_id: &'t str,
}

impl<'t> DiscountRepository<'t> {
    pub(crate) fn new(conn: &'t mut SqliteConnection, business_id: &'t str) -> Self {
        DiscountRepository { conn, business_id }
    }

    pub async fn insert(&mut self, discount: &Discount) -> DbResult<()> {
        debug!(id = %discount.id, kind = ?discount.kind, value = discount.value, "Inserting discount");

        sqlx::query(
            r#"
            INSERT INTO discounts (
                id, business_id, name, kind, value, scope,
                starts_at, ends_at, is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&discount.id)
        .bind(self.business_id)
        .bind(&discount.name)
        .bind(discount.kind)
        .bind(discount.value)
        .bind(discount.scope)
        .bind(discount.starts_at)
        .bind(discount.ends_at)
        .bind(discount.is_active)
        .bind(discount.created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn get(&mut self, id: &str) -> DbResult<Discount> {
        let found = sqlx::query_as::<_, Discount>(
            r#"
            SELECT id, business_id, name, kind, value, scope,
                   starts_at, ends_at, is_active, created_at
            FROM discounts
            WHERE id = ?1 AND business_id = ?2
            "#,
        )
        .bind(id)
        .bind(self.business_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        require(found, &mut *self.conn, Owned::Discount, id, self.business_id).await
    }
}
