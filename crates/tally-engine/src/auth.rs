//! # Authorization Seam
//!
//! The engine does not know about roles or sessions. Before every operation
//! it asks an [`Authorizer`] whether the calling user may perform the action
//! in the business, and refuses with `PermissionDenied` when told no.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operations a caller can be allowed or denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ManageCatalog,
    ReceiveStock,
    CloseBatch,
    RecordMovement,
    ViewInventory,
    CreateOrder,
    AdvanceOrder,
    CancelOrder,
    ViewOrders,
    ApplyPayment,
    Refund,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::ManageCatalog => "manage_catalog",
            Action::ReceiveStock => "receive_stock",
            Action::CloseBatch => "close_batch",
            Action::RecordMovement => "record_movement",
            Action::ViewInventory => "view_inventory",
            Action::CreateOrder => "create_order",
            Action::AdvanceOrder => "advance_order",
            Action::CancelOrder => "cancel_order",
            Action::ViewOrders => "view_orders",
            Action::ApplyPayment => "apply_payment",
            Action::Refund => "refund",
        };
        write!(f, "{}", name)
    }
}

/// Permission predicate supplied by the authorization layer.
pub trait Authorizer: Send + Sync {
    fn can_perform(&self, user_id: &str, action: Action, business_id: &str) -> bool;
}

/// Grants everything. Used when authorization happens entirely upstream.
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn can_perform(&self, _user_id: &str, _action: Action, _business_id: &str) -> bool {
        true
    }
}

/// Any closure with the right shape is an authorizer.
impl<F> Authorizer for F
where
    F: Fn(&str, Action, &str) -> bool + Send + Sync,
{
    fn can_perform(&self, user_id: &str, action: Action, business_id: &str) -> bool {
        self(user_id, action, business_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_authorizer() {
        let read_only = |_: &str, action: Action, _: &str| {
            matches!(action, Action::ViewInventory | Action::ViewOrders)
        };
        assert!(read_only.can_perform("u1", Action::ViewOrders, "b1"));
        assert!(!read_only.can_perform("u1", Action::Refund, "b1"));
        assert!(AllowAll.can_perform("u1", Action::Refund, "b1"));
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::ApplyPayment.to_string(), "apply_payment");
    }
}
