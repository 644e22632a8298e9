//! # Engine Error Type
//!
//! What callers of the engine see. Core rule violations and database
//! failures are folded into one enum that keeps their structured detail.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ValidationError ─┐                                                     │
//! │                   ├──► CoreError ──┐                                    │
//! │  pure rules ──────┘                │                                    │
//! │                                    ├──► EngineError ──► caller          │
//! │  DbError ──────────────────────────┘         │                          │
//! │    Busy / Conflict / PoolExhausted           │                          │
//! │         └──────────► Contention ─────────────┘                          │
//! │                      (the only retryable kind)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is worded for end users. Each variant carries the ids and
//! quantities a calling layer needs to phrase its own message, and
//! [`EngineError::code`] gives it a stable machine-readable tag.

use thiserror::Error;

use crate::auth::Action;
use tally_core::{CoreError, Money, OrderStatus, ValidationError};
use tally_db::DbError;

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed input, or a referenced record that cannot be used.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Not enough live stock. `entry_id` is set when a single movement
    /// would take one entry below zero.
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        entry_id: Option<String>,
        requested: i64,
        available: i64,
    },

    #[error("Order {order_id} cannot move from {from:?} to {to:?}")]
    InvalidStateTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Payment of {attempted} on order {order_id} exceeds remaining balance {remaining}")]
    Overpayment {
        order_id: String,
        attempted: Money,
        remaining: Money,
    },

    #[error("Refund of {requested} units on order item {order_item_id} exceeds refundable {refundable}")]
    RefundExceedsOriginal {
        order_item_id: String,
        requested: i64,
        refundable: i64,
    },

    /// The order's status does not allow the operation.
    #[error("Order {order_id} is {status:?}, cannot {operation}")]
    OrderClosed {
        order_id: String,
        status: OrderStatus,
        operation: String,
    },

    /// Lock or version conflict that outlasted the retry budget.
    #[error("Contention: {0}")]
    Contention(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The id exists, but in another business.
    #[error("{entity} {id} belongs to another business")]
    TenantMismatch { entity: String, id: String },

    /// The authorizer refused the caller.
    #[error("User {user_id} may not {action} in business {business_id}")]
    PermissionDenied {
        user_id: String,
        action: Action,
        business_id: String,
    },

    /// Any other storage failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl EngineError {
    /// Only contention is worth retrying; everything else is final for the
    /// request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Contention(_))
    }

    /// Machine-readable tag for the calling layer.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "VALIDATION_ERROR",
            EngineError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            EngineError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            EngineError::Overpayment { .. } => "OVERPAYMENT",
            EngineError::RefundExceedsOriginal { .. } => "REFUND_EXCEEDS_ORIGINAL",
            EngineError::OrderClosed { .. } => "ORDER_CLOSED",
            EngineError::Contention(_) => "CONTENTION",
            EngineError::NotFound { .. } => "NOT_FOUND",
            EngineError::TenantMismatch { .. } => "TENANT_MISMATCH",
            EngineError::PermissionDenied { .. } => "PERMISSION_DENIED",
            EngineError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

/// Converts core rule violations.
impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientStock {
                product_id,
                entry_id,
                requested,
                available,
            } => EngineError::InsufficientStock {
                product_id,
                entry_id,
                requested,
                available,
            },
            CoreError::InvalidStateTransition { order_id, from, to } => {
                EngineError::InvalidStateTransition { order_id, from, to }
            }
            CoreError::Overpayment {
                order_id,
                attempted,
                remaining,
            } => EngineError::Overpayment {
                order_id,
                attempted,
                remaining,
            },
            CoreError::RefundExceedsOriginal {
                order_item_id,
                requested,
                refundable,
            } => EngineError::RefundExceedsOriginal {
                order_item_id,
                requested,
                refundable,
            },
            CoreError::OrderClosed {
                order_id,
                status,
                operation,
            } => EngineError::OrderClosed {
                order_id,
                status,
                operation,
            },
            CoreError::Validation(e) => EngineError::Validation(e),
        }
    }
}

/// Converts database errors.
impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        if err.is_contention() {
            return EngineError::Contention(err.to_string());
        }

        match err {
            DbError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            DbError::TenantMismatch { entity, id } => EngineError::TenantMismatch { entity, id },
            DbError::UniqueViolation { field, value } => {
                EngineError::Validation(ValidationError::Duplicate { field, value })
            }
            other => {
                // Log the actual error; callers get the short form
                tracing::error!(error = %other, "Database operation failed");
                EngineError::Storage(other.to_string())
            }
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contention_is_the_only_retryable_kind() {
        let busy: EngineError = DbError::Busy("database is locked".to_string()).into();
        assert!(busy.is_retryable());
        assert_eq!(busy.code(), "CONTENTION");

        let conflict: EngineError = DbError::conflict("inventory entry", "E1").into();
        assert!(conflict.is_retryable());

        let mismatch: EngineError = DbError::tenant_mismatch("order", "O1").into();
        assert!(!mismatch.is_retryable());
        assert!(matches!(mismatch, EngineError::TenantMismatch { .. }));
    }

    #[test]
    fn test_core_error_keeps_detail() {
        let err: EngineError = CoreError::InsufficientStock {
            product_id: "P1".to_string(),
            entry_id: None,
            requested: 60,
            available: 10,
        }
        .into();

        match err {
            EngineError::InsufficientStock {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, 60);
                assert_eq!(available, 10);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_storage_failures_are_final() {
        let err: EngineError = DbError::QueryFailed("injected".to_string()).into();
        assert!(!err.is_retryable());
        assert_eq!(err.code(), "STORAGE_ERROR");

        let dup: EngineError = DbError::UniqueViolation {
            field: "products.business_id, products.sku".to_string(),
            value: "unknown".to_string(),
        }
        .into();
        assert!(matches!(dup, EngineError::Validation(ValidationError::Duplicate { .. })));
    }
}
