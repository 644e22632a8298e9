//! # tally-engine: Inventory Ledger and Order Fulfillment
//!
//! Runs the rules in tally-core against tally-db transactions: receiving
//! batches, the movement log, orders, payments and refunds, for many
//! businesses sharing one database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Architecture                             │
//! │                                                                         │
//! │  caller (HTTP layer, dashboard, seed binary)                            │
//! │       │  engine.for_tenant(business_id, user_id)                        │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 ★ tally-engine (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │  TenantSession                                                  │   │
//! │  │   ├── catalog      register supplier/customer/product/discount  │   │
//! │  │   ├── ledger       receive, receive_into, close_batch           │   │
//! │  │   ├── movements    record_movement, adjust, history, audit      │   │
//! │  │   ├── fulfillment  create_order, advance, cancel                │   │
//! │  │   ├── payments     apply_payment, payment_summary               │   │
//! │  │   └── refunds      refund, refunds_for_order                    │   │
//! │  │                                                                 │   │
//! │  │  auth (Authorizer)   retry (backoff)   config (env)             │   │
//! │  └─────────────┬───────────────────────────────────┬───────────────┘   │
//! │                │                                   │                    │
//! │        tally-core rules                   tally-db TenantTx             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use tally_engine::{Engine, EngineConfig};
//!
//! let engine = Engine::connect(&EngineConfig::from_env()?).await?;
//! let business = engine.register_business("Corner Shop").await?;
//! let session = engine.for_tenant(&business.id, "clerk-1");
//!
//! let details = session.create_order(new_order).await?;
//! session.apply_payment(&details.order.id, details.order.total_cents, PaymentMethod::Cash, None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod fulfillment;
pub mod ledger;
pub mod movements;
pub mod payments;
pub mod refunds;
pub mod retry;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use auth::{Action, AllowAll, Authorizer};
pub use catalog::{NewDiscount, NewProduct};
pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, TenantSession};
pub use error::{EngineError, EngineResult};
pub use fulfillment::OrderDetails;
pub use ledger::Receipt;
pub use movements::{EntryAudit, MovementHistory, ProductReconciliation};
pub use payments::PaymentReceipt;
pub use refunds::RefundDetails;
pub use retry::RetryPolicy;
