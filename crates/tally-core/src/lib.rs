//! # tally-core: Pure Inventory and Fulfillment Logic
//!
//! Every rule of the inventory ledger that can be decided without touching
//! storage lives here: money arithmetic, input validation, FEFO/FIFO
//! allocation plans, order totals, the order state graph, payment status and
//! refund amounts.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │             HTTP layer / dashboard (outside workspace)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                      tally-engine                               │   │
//! │  │   receive, record_movement, create_order, apply_payment, refund │   │
//! │  └─────────────┬───────────────────────────────────┬───────────────┘   │
//! │                │ plans, totals, rules              │ transactions      │
//! │  ┌─────────────▼─────────────────────┐  ┌──────────▼───────────────┐   │
//! │  │    ★ tally-core (THIS CRATE) ★    │  │        tally-db          │   │
//! │  │                                   │  │  SQLite, tenant scope,   │   │
//! │  │  types  money  allocation pricing │  │  repositories            │   │
//! │  │  lifecycle  refund  validation    │  └──────────────────────────┘   │
//! │  │                                   │                                 │
//! │  │  NO I/O • NO DATABASE • NO CLOCK  │                                 │
//! │  └───────────────────────────────────┘                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records and input shapes
//! - [`money`] - Integer money, basis points, proportional splits
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`allocation`] - FEFO/FIFO deduction and reversal plans
//! - [`pricing`] - Order totals and discount caps
//! - [`lifecycle`] - Order state graph and payment status
//! - [`refund`] - Refund quantities and amounts
//! - [`clock`] - Time source abstraction
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::lifecycle::payment_status;
//! use tally_core::money::Money;
//! use tally_core::types::PaymentStatus;
//!
//! let total = Money::from_cents(20000);
//! let paid = Money::from_cents(12000);
//! assert_eq!(payment_status(paid, total), PaymentStatus::PartiallyPaid);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod clock;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod pricing;
pub mod refund;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines in a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum units on a single line, receiving or adjustment.
///
/// ## Business Reason
/// Catches typos (an extra zero or three) before they reach the ledger.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// Maximum unit price, cost price or selling price, in cents.
///
/// With `MAX_LINE_QUANTITY` and `MAX_ORDER_LINES` this keeps every order
/// subtotal below 10^18 cents, inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// Maximum single amount (tax, fixed discount, payment), in cents.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000_000_000;
