//! # Product Repository
//!
//! Database operations for products and the cached product quantity.
//!
//! ## Cached Quantity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products.quantity = Σ inventory_entries.quantity_on_hand               │
//! │                                                                         │
//! │  receive      ──► add_quantity(+received)                               │
//! │  movement     ──► add_quantity(signed qty)    same transaction          │
//! │  reconcile    ──► set_quantity(live_quantity())                         │
//! │                                                                         │
//! │  The entries are the truth; this column is a read-side cache.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use crate::scope::{miss, require, Owned};
use tally_core::Product;

const PRODUCT_COLUMNS: &str = r#"
    id, business_id, sku, name, reorder_threshold, quantity, is_active, created_at, updated_at
"#;

/// Product records of one business.
pub struct ProductRepository<'t> {
    conn: &'t mut SqliteConnection,
    business_id: &'t str,
}

impl<'t> ProductRepository<'t> {
    pub(crate) fn new(conn: &'t mut SqliteConnection, business_id: &'t str) -> Self {
        ProductRepository { conn, business_id }
    }

    /// Inserts a product. A duplicate SKU within the business fails with
    /// `UniqueViolation`.
    pub async fn insert(&mut self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, business_id, sku, name, reorder_threshold, quantity,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(self.business_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.reorder_threshold)
        .bind(product.quantity)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Gets a product by ID.
    pub async fn get(&mut self, id: &str) -> DbResult<Product> {
        let sql = format!(
            "SELECT {} FROM products WHERE id = ?1 AND business_id = ?2",
            PRODUCT_COLUMNS
        );
        let found = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(self.business_id)
            .fetch_optional(&mut *self.conn)
            .await?;

        require(found, &mut *self.conn, Owned::Product, id, self.business_id).await
    }

    /// Adds `delta` to the cached quantity.
    pub async fn add_quantity(&mut self, id: &str, delta: i64, now: DateTime<Utc>) -> DbResult<()> {
        debug!(id = %id, delta = delta, "Adjusting cached product quantity");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity + ?1, updated_at = ?2
            WHERE id = ?3 AND business_id = ?4
            "#,
        )
        .bind(delta)
        .bind(now)
        .bind(id)
        .bind(self.business_id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(miss(&mut *self.conn, Owned::Product, id, self.business_id).await);
        }
        Ok(())
    }

    /// Overwrites the cached quantity.
    pub async fn set_quantity(&mut self, id: &str, quantity: i64, now: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity = ?1, updated_at = ?2
            WHERE id = ?3 AND business_id = ?4
            "#,
        )
        .bind(quantity)
        .bind(now)
        .bind(id)
        .bind(self.business_id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(miss(&mut *self.conn, Owned::Product, id, self.business_id).await);
        }
        Ok(())
    }

    /// Sums the live quantity of the product's entries.
    pub async fn live_quantity(&mut self, id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(quantity_on_hand), 0)
            FROM inventory_entries
            WHERE product_id = ?1 AND business_id = ?2
            "#,
        )
        .bind(id)
        .bind(self.business_id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(total)
    }

    /// Active products at or below their reorder threshold, lowest stock first.
    pub async fn low_stock(&mut self) -> DbResult<Vec<Product>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM products
            WHERE business_id = ?1 AND is_active = 1 AND quantity <= reorder_threshold
            ORDER BY quantity ASC, sku ASC
            "#,
            PRODUCT_COLUMNS
        );
        let rows = sqlx::query_as::<_, Product>(&sql)
            .bind(self.business_id)
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use crate::test_support::{product, seed_business};
    use crate::DbError;
    use chrono::Utc;

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let b = seed_business(&db, "Shop").await;

        let mut tx = db.tenant(&b).begin().await.unwrap();
        tx.products().insert(&product(&b, "SKU-1")).await.unwrap();
        let err = tx.products().insert(&product(&b, "SKU-1")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_quantity_cache_and_low_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let b = seed_business(&db, "Shop").await;

        let mut low = product(&b, "SKU-LOW");
        low.reorder_threshold = 5;
        let mut high = product(&b, "SKU-HIGH");
        high.reorder_threshold = 5;

        let mut tx = db.tenant(&b).begin().await.unwrap();
        tx.products().insert(&low).await.unwrap();
        tx.products().insert(&high).await.unwrap();
        tx.products().add_quantity(&high.id, 20, Utc::now()).await.unwrap();
        tx.products().add_quantity(&low.id, 3, Utc::now()).await.unwrap();

        let report = tx.products().low_stock().await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].id, low.id);

        // The cache never goes negative
        let err = tx.products().add_quantity(&low.id, -4, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
