//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Malformed input                                │
//! │                                                                         │
//! │  tally-db errors                                                       │
//! │  └── DbError          - Storage, contention, tenant scoping            │
//! │                                                                         │
//! │  tally-engine errors                                                   │
//! │  └── EngineError      - What the calling layer sees                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError ← DbError             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Errors carry ids and quantities, never user-facing sentences; the calling
//! layer decides how to word them.

use thiserror::Error;

use crate::money::Money;
use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations detected by pure logic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Not enough live stock across the product's entries, or a single
    /// movement would drive an entry below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// create order (P1 × 60)
    ///      │
    ///      ▼
    /// live stock across entries = 10
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: "P1", requested: 60, available: 10 }
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        entry_id: Option<String>,
        requested: i64,
        available: i64,
    },

    /// Order status move not present in the state graph.
    #[error("Order {order_id} cannot move from {from:?} to {to:?}")]
    InvalidStateTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Payment would take the paid sum above the effective order total.
    #[error("Payment of {attempted} on order {order_id} exceeds remaining balance {remaining}")]
    Overpayment {
        order_id: String,
        attempted: Money,
        remaining: Money,
    },

    /// Refund quantity exceeds what is still refundable on an order item.
    #[error("Refund of {requested} units on order item {order_item_id} exceeds refundable {refundable}")]
    RefundExceedsOriginal {
        order_item_id: String,
        requested: i64,
        refundable: i64,
    },

    /// Order is in a terminal or not-yet-committed state for the operation.
    #[error("Order {order_id} is {status:?}, cannot {operation}")]
    OrderClosed {
        order_id: String,
        status: OrderStatus,
        operation: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any state is read or written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// The same value appears twice where it must be unique.
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },

    /// Referenced record exists but cannot be used right now.
    #[error("{field} '{value}' is not usable: {reason}")]
    Unusable {
        field: String,
        value: String,
        reason: String,
    },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Unusable`].
    pub fn unusable(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ValidationError::Unusable {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "P1".to_string(),
            entry_id: None,
            requested: 60,
            available: 10,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product P1: available 10, requested 60"
        );

        let err = CoreError::Overpayment {
            order_id: "O1".to_string(),
            attempted: Money::from_cents(100),
            remaining: Money::zero(),
        };
        assert_eq!(
            err.to_string(),
            "Payment of $1.00 on order O1 exceeds remaining balance $0.00"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "product_id".to_string(),
        };
        assert_eq!(err.to_string(), "product_id is required");

        let err = ValidationError::MustNotBeNegative {
            field: "cost_price".to_string(),
        };
        assert_eq!(err.to_string(), "cost_price must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "sku".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
