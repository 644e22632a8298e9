//! # Tenant Scope
//!
//! The only way to reach tenant data. Every repository handed out here is
//! bound to one business_id and one open transaction.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Database ──tenant(b1)──► TenantScope { pool, b1 }                      │
//! │                                  │                                      │
//! │                               begin()                                   │
//! │                                  ▼                                      │
//! │                           TenantTx { tx, b1 }                           │
//! │                 ┌────────────────┼────────────────┐                     │
//! │                 ▼                ▼                ▼                     │
//! │          products()         entries()        orders() ...               │
//! │       WHERE business_id = b1 on every statement                         │
//! │                                  │                                      │
//! │                      commit() / rollback() / drop                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A dropped `TenantTx` rolls back.
//!
//! ## Misses
//! A scoped lookup that finds nothing is resolved here, and only here, by
//! asking whether the id exists under another business. The answer decides
//! between `NotFound` and `TenantMismatch`; no row from the other business
//! is ever read.

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::batch::BatchRepository;
use crate::repository::catalog::{CustomerRepository, SupplierRepository};
use crate::repository::discount::DiscountRepository;
use crate::repository::entry::EntryRepository;
use crate::repository::movement::MovementRepository;
use crate::repository::order::OrderRepository;
use crate::repository::payment::PaymentRepository;
use crate::repository::product::ProductRepository;
use crate::repository::refund::RefundRepository;

// =============================================================================
// Owned Tables
// =============================================================================

/// Tables whose rows belong to a business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Owned {
    Supplier,
    Customer,
    Product,
    Discount,
    Batch,
    Entry,
    Order,
    OrderItem,
    Refund,
}

impl Owned {
    fn table(self) -> &'static str {
        match self {
            Owned::Supplier => "suppliers",
            Owned::Customer => "customers",
            Owned::Product => "products",
            Owned::Discount => "discounts",
            Owned::Batch => "batches",
            Owned::Entry => "inventory_entries",
            Owned::Order => "orders",
            Owned::OrderItem => "order_items",
            Owned::Refund => "refunds",
        }
    }

    pub(crate) fn entity(self) -> &'static str {
        match self {
            Owned::Supplier => "supplier",
            Owned::Customer => "customer",
            Owned::Product => "product",
            Owned::Discount => "discount",
            Owned::Batch => "batch",
            Owned::Entry => "inventory entry",
            Owned::Order => "order",
            Owned::OrderItem => "order item",
            Owned::Refund => "refund",
        }
    }
}

/// Turns a scoped miss into `NotFound` or `TenantMismatch`.
pub(crate) async fn miss(conn: &mut SqliteConnection, kind: Owned, id: &str, business_id: &str) -> DbError {
    let sql = format!("SELECT business_id FROM {} WHERE id = ?1", kind.table());
    let owner: Result<Option<String>, sqlx::Error> =
        sqlx::query_scalar(&sql).bind(id).fetch_optional(conn).await;

    match owner {
        Ok(Some(owner)) if owner != business_id => {
            debug!(entity = kind.entity(), id = %id, "Cross-tenant lookup rejected");
            DbError::tenant_mismatch(kind.entity(), id)
        }
        Ok(_) => DbError::not_found(kind.entity(), id),
        Err(e) => e.into(),
    }
}

/// Unwraps a scoped lookup, resolving a miss.
pub(crate) async fn require<T>(
    found: Option<T>,
    conn: &mut SqliteConnection,
    kind: Owned,
    id: &str,
    business_id: &str,
) -> DbResult<T> {
    match found {
        Some(row) => Ok(row),
        None => Err(miss(conn, kind, id, business_id).await),
    }
}

// =============================================================================
// Tenant Scope
// =============================================================================

/// Accessor bound to one business.
#[derive(Debug, Clone)]
pub struct TenantScope {
    pool: SqlitePool,
    business_id: String,
}

impl TenantScope {
    pub(crate) fn new(pool: SqlitePool, business_id: String) -> Self {
        TenantScope { pool, business_id }
    }

    pub fn business_id(&self) -> &str {
        &self.business_id
    }

    /// Opens a transaction bound to the business.
    ///
    /// Fails with `NotFound` if the business is not registered.
    pub async fn begin(&self) -> DbResult<TenantTx> {
        let mut tx = self.pool.begin().await?;

        let known: Option<String> = sqlx::query_scalar("SELECT id FROM businesses WHERE id = ?1")
            .bind(&self.business_id)
            .fetch_optional(&mut *tx)
            .await?;
        if known.is_none() {
            return Err(DbError::not_found("business", &self.business_id));
        }

        Ok(TenantTx {
            tx,
            business_id: self.business_id.clone(),
        })
    }
}

// =============================================================================
// Tenant Transaction
// =============================================================================

/// An open transaction bound to one business.
#[derive(Debug)]
pub struct TenantTx {
    tx: Transaction<'static, Sqlite>,
    business_id: String,
}

impl TenantTx {
    pub fn business_id(&self) -> &str {
        &self.business_id
    }

    pub fn suppliers(&mut self) -> SupplierRepository<'_> {
        SupplierRepository::new(&mut self.tx, &self.business_id)
    }

    pub fn customers(&mut self) -> CustomerRepository<'_> {
        CustomerRepository::new(&mut self.tx, &self.business_id)
    }

    pub fn products(&mut self) -> ProductRepository<'_> {
        ProductRepository::new(&mut self.tx, &self.business_id)
    }

    pub fn discounts(&mut self) -> DiscountRepository<'_> {
        DiscountRepository::new(&mut self.tx, &self.business_id)
    }

    pub fn batches(&mut self) -> BatchRepository<'_> {
        BatchRepository::new(&mut self.tx, &self.business_id)
    }

    pub fn entries(&mut self) -> EntryRepository<'_> {
        EntryRepository::new(&mut self.tx, &self.business_id)
    }

    pub fn movements(&mut self) -> MovementRepository<'_> {
        MovementRepository::new(&mut self.tx, &self.business_id)
    }

    pub fn orders(&mut self) -> OrderRepository<'_> {
        OrderRepository::new(&mut self.tx, &self.business_id)
    }

    pub fn payments(&mut self) -> PaymentRepository<'_> {
        PaymentRepository::new(&mut self.tx, &self.business_id)
    }

    pub fn refunds(&mut self) -> RefundRepository<'_> {
        RefundRepository::new(&mut self.tx, &self.business_id)
    }

    /// Commits every write made through this transaction.
    pub async fn commit(self) -> DbResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Discards every write made through this transaction.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
