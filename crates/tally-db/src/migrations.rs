//! # Database Migrations
//!
//! Embedded SQL migrations for Tally.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Database::new                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Check _sqlx_migrations table (create if missing)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs applied                                │
//! │       │                                                                 │
//! │       └── 001_initial_schema.sql                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run pending migrations in order, record in _sqlx_migrations           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNN_description.sql`
//! 3. **NEVER** modify existing migrations - always add new ones

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the `migrations/sqlite` directory.
///
/// The `sqlx::migrate!()` macro embeds all SQL files from the directory into
/// the binary at compile time.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// ## Safety
/// - Idempotent: safe to run multiple times
/// - Transactional: each migration runs in a transaction
/// - Ordered: migrations run in filename order (001, 002, ...)
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)`.
///
/// For diagnostics and health checks.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        run_migrations(db.pool()).await.unwrap();

        let (total, applied) = migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
        assert!(total >= 1);
    }

    #[tokio::test]
    async fn test_movements_reject_update_and_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        sqlx::raw_sql(
            r#"
            INSERT INTO businesses (id, name, created_at) VALUES ('b', 'B', '2026-01-01T00:00:00Z');
            INSERT INTO suppliers (id, business_id, name, created_at) VALUES ('s', 'b', 'S', '2026-01-01T00:00:00Z');
            INSERT INTO products (id, business_id, sku, name, created_at, updated_at)
                VALUES ('p', 'b', 'SKU-1', 'P', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z');
            INSERT INTO batches (id, business_id, supplier_id, created_by, received_at)
                VALUES ('ba', 'b', 's', 'u', '2026-01-01T00:00:00Z');
            INSERT INTO inventory_entries (id, business_id, batch_id, product_id, cost_price_cents,
                selling_price_cents, quantity_received, quantity_on_hand, received_at)
                VALUES ('e', 'b', 'ba', 'p', 100, 200, 10, 10, '2026-01-01T00:00:00Z');
            INSERT INTO inventory_movements (id, business_id, entry_id, product_id, movement_type,
                quantity, reason, created_at)
                VALUES ('m', 'b', 'e', 'p', 'ADJUSTMENT', -1, 'adjustment', '2026-01-01T00:00:00Z');
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();

        let update = sqlx::query("UPDATE inventory_movements SET quantity = 5 WHERE id = 'm'")
            .execute(db.pool())
            .await;
        assert!(update.is_err());

        let delete = sqlx::query("DELETE FROM inventory_movements WHERE id = 'm'")
            .execute(db.pool())
            .await;
        assert!(delete.is_err());
    }
}
