//! # Repository Module
//!
//! Database repository implementations for Tally.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Tenant-Scoped Repositories                           │
//! │                                                                         │
//! │  Engine operation                                                      │
//! │       │                                                                 │
//! │       │  let mut tx = db.tenant(b1).begin().await?;                    │
//! │       │  tx.entries().candidates(product_id)                           │
//! │       ▼                                                                 │
//! │  EntryRepository<'t> { conn: &'t mut SqliteConnection, business_id }   │
//! │  ├── insert(&mut self, entry)                                          │
//! │  ├── get(&mut self, id)                                                │
//! │  └── apply_delta(&mut self, entry, delta)                              │
//! │       │                                                                 │
//! │       │  SQL with `business_id = ?` bound on every statement            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  A repository borrows the transaction, so every read and write an      │
//! │  operation makes lands in the same transaction.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`BusinessRepository`](business::BusinessRepository) - Tenant registry (pool-backed, unscoped)
//! - [`SupplierRepository`](catalog::SupplierRepository), [`CustomerRepository`](catalog::CustomerRepository)
//! - [`ProductRepository`](product::ProductRepository) - Products and the cached quantity
//! - [`DiscountRepository`](discount::DiscountRepository) - Registered discounts
//! - [`BatchRepository`](batch::BatchRepository) - Received shipments
//! - [`EntryRepository`](entry::EntryRepository) - Priced stock lines, guarded quantity updates
//! - [`MovementRepository`](movement::MovementRepository) - Append-only movement log
//! - [`OrderRepository`](order::OrderRepository) - Orders, items, applied discounts
//! - [`PaymentRepository`](payment::PaymentRepository) - Payment facts
//! - [`RefundRepository`](refund::RefundRepository) - Refunds and refund items

pub mod batch;
pub mod business;
pub mod catalog;
pub mod discount;
pub mod entry;
pub mod movement;
pub mod order;
pub mod payment;
pub mod product;
pub mod refund;
