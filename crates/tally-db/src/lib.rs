//! # tally-db: Database Layer for Tally
//!
//! SQLite persistence for the inventory ledger: pool, embedded migrations,
//! error mapping and tenant-scoped repositories.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Data Flow                                │
//! │                                                                         │
//! │  tally-engine operation (create_order)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  TenantScope  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │───►│  TenantTx     │    │  (embedded)  │  │   │
//! │  │   │               │    │  (scope.rs)   │    │              │  │   │
//! │  │   │ SqlitePool    │    │      │        │    │ 001_initial  │  │   │
//! │  │   └───────────────┘    │      ▼        │    └──────────────┘  │   │
//! │  │                        │ Repositories  │                      │   │
//! │  │                        └───────────────┘                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`scope`] - Tenant-bound transactions
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/tally.db")).await?;
//!
//! let mut tx = db.tenant(&business_id).begin().await?;
//! let entries = tx.entries().candidates(&product_id).await?;
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod scope;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use scope::{TenantScope, TenantTx};

// Repository re-exports for convenience
pub use repository::batch::BatchRepository;
pub use repository::business::BusinessRepository;
pub use repository::catalog::{CustomerRepository, SupplierRepository};
pub use repository::discount::DiscountRepository;
pub use repository::entry::EntryRepository;
pub use repository::movement::MovementRepository;
pub use repository::order::OrderRepository;
pub use repository::payment::PaymentRepository;
pub use repository::product::ProductRepository;
pub use repository::refund::RefundRepository;
