//! # Validation Module
//!
//! Input validation for engine operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP layer (outside this workspace)                          │
//! │  ├── Payload shape, permissions                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Quantities, prices, amounts, ids                                  │
//! │  └── Runs before any row is read or written                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── CHECK (quantity_on_hand >= 0)                                     │
//! │  └── Foreign keys, append-only triggers                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::{
    DiscountInput, DiscountKind, NewEntry, NewOrder, OrderLineInput, RefundRequest, RefundType,
};
use crate::{MAX_AMOUNT_CENTS, MAX_LINE_QUANTITY, MAX_ORDER_LINES, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_sku;
///
/// assert!(validate_sku("RICE-5KG").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (business, product, supplier, ...).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates an identifier: non-empty UUID.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_id;
///
/// assert!(validate_id("order_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_id("order_id", "not-a-uuid").is_err());
/// ```
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity that must be at least one unit.
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a received quantity. Zero is allowed (placeholder line).
pub fn validate_received_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or amount in cents that may be zero (free items).
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("cost_price", 0).is_ok());
/// assert!(validate_price_cents("cost_price", -1).is_err());
/// assert!(validate_price_cents("cost_price", 10_000_000_001).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    validate_bounded_cents(field, cents, MAX_PRICE_CENTS)
}

/// Validates a non-negative order-level amount (tax, fixed discount).
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    validate_bounded_cents(field, cents, MAX_AMOUNT_CENTS)
}

fn validate_bounded_cents(field: &str, cents: i64, max: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    if cents > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max,
        });
    }

    Ok(())
}

/// Validates a payment amount in cents.
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "payment amount".to_string(),
            min: 1,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

/// Validates a non-zero adjustment quantity.
pub fn validate_adjustment(qty: i64) -> ValidationResult<()> {
    if qty == 0 {
        return Err(ValidationError::OutOfRange {
            field: "adjustment".to_string(),
            min: -MAX_LINE_QUANTITY,
            max: MAX_LINE_QUANTITY,
        });
    }

    if qty.abs() > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "adjustment".to_string(),
            min: -MAX_LINE_QUANTITY,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Input Validators
// =============================================================================

/// Validates one entry of a receiving.
pub fn validate_new_entry(entry: &NewEntry) -> ValidationResult<()> {
    validate_id("product_id", &entry.product_id)?;
    validate_price_cents("cost_price", entry.cost_price_cents)?;
    validate_price_cents("selling_price", entry.selling_price_cents)?;
    validate_received_quantity(entry.quantity)?;
    Ok(())
}

/// Validates a whole receiving: at least one entry, every entry valid.
pub fn validate_new_entries(entries: &[NewEntry]) -> ValidationResult<()> {
    if entries.is_empty() {
        return Err(ValidationError::Required {
            field: "entries".to_string(),
        });
    }

    entries.iter().try_for_each(validate_new_entry)
}

/// Validates an order line.
pub fn validate_order_line(line: &OrderLineInput) -> ValidationResult<()> {
    validate_id("product_id", &line.product_id)?;
    validate_quantity("quantity", line.quantity)?;
    validate_price_cents("unit_price", line.unit_price_cents)?;
    validate_amount_cents("item discount", line.discount_cents)?;
    Ok(())
}

/// Validates an order-level discount.
pub fn validate_discount_input(discount: &DiscountInput) -> ValidationResult<()> {
    if let Some(id) = &discount.discount_id {
        validate_id("discount_id", id)?;
    }

    match discount.kind {
        DiscountKind::Percentage => {
            if !(0..=crate::money::BPS_SCALE).contains(&discount.value) {
                return Err(ValidationError::OutOfRange {
                    field: "discount percentage".to_string(),
                    min: 0,
                    max: crate::money::BPS_SCALE,
                });
            }
        }
        DiscountKind::Fixed => validate_amount_cents("discount amount", discount.value)?,
    }

    Ok(())
}

/// Validates an order request before any stock is touched.
pub fn validate_new_order(order: &NewOrder) -> ValidationResult<()> {
    if order.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if order.items.len() > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_LINES as i64,
        });
    }

    if let Some(customer_id) = &order.customer_id {
        validate_id("customer_id", customer_id)?;
    }

    order.items.iter().try_for_each(validate_order_line)?;
    order.discounts.iter().try_for_each(validate_discount_input)?;
    validate_amount_cents("tax", order.tax_cents)?;
    Ok(())
}

/// Validates the shape of a refund request (quantities are checked against
/// the order separately).
pub fn validate_refund_request(request: &RefundRequest) -> ValidationResult<()> {
    if request.refund_type == RefundType::Full {
        return Ok(());
    }

    if request.items.is_empty() {
        return Err(ValidationError::Required {
            field: "refund items".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for line in &request.items {
        validate_id("order_item_id", &line.order_item_id)?;
        validate_quantity("refund quantity", line.quantity)?;
        if !seen.insert(line.order_item_id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "order_item_id".to_string(),
                value: line.order_item_id.clone(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RefundLineInput;

    const PRODUCT: &str = "550e8400-e29b-41d4-a716-446655440000";
    const ITEM: &str = "6ba7b810-9dad-11d1-80b4-00c04fd430c8";

    fn line(quantity: i64, unit_price_cents: i64) -> OrderLineInput {
        OrderLineInput {
            product_id: PRODUCT.to_string(),
            quantity,
            unit_price_cents,
            discount_cents: 0,
        }
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("COKE-330").is_ok());
        assert!(validate_sku("product_1").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Acme Wholesale").is_ok());
        assert!(validate_name("name", "  ").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("id", PRODUCT).is_ok());
        assert!(validate_id("id", "").is_err());
        assert!(validate_id("id", "123").is_err());
    }

    #[test]
    fn test_validate_new_entry_rejects_negatives() {
        let mut entry = NewEntry {
            product_id: PRODUCT.to_string(),
            cost_price_cents: 100,
            selling_price_cents: 150,
            quantity: 10,
            expiry_date: None,
        };
        assert!(validate_new_entry(&entry).is_ok());

        entry.cost_price_cents = -1;
        assert_eq!(
            validate_new_entry(&entry),
            Err(ValidationError::MustNotBeNegative {
                field: "cost_price".to_string()
            })
        );

        entry.cost_price_cents = 100;
        entry.quantity = -5;
        assert!(validate_new_entry(&entry).is_err());

        assert!(validate_new_entries(&[]).is_err());
    }

    #[test]
    fn test_validate_new_order() {
        let mut order = NewOrder {
            customer_id: None,
            items: vec![line(3, 500)],
            discounts: vec![],
            tax_cents: 0,
            notes: None,
        };
        assert!(validate_new_order(&order).is_ok());

        order.items = vec![line(0, 500)];
        assert!(validate_new_order(&order).is_err());

        order.items = vec![];
        assert!(validate_new_order(&order).is_err());

        order.items = vec![line(1, 500)];
        order.discounts = vec![DiscountInput {
            discount_id: None,
            kind: DiscountKind::Percentage,
            value: 10_001,
        }];
        assert!(validate_new_order(&order).is_err());
    }

    #[test]
    fn test_validate_refund_request() {
        let full = RefundRequest {
            refund_type: RefundType::Full,
            items: vec![],
            reason: None,
        };
        assert!(validate_refund_request(&full).is_ok());

        let empty_partial = RefundRequest {
            refund_type: RefundType::Partial,
            items: vec![],
            reason: None,
        };
        assert!(validate_refund_request(&empty_partial).is_err());

        let duplicate = RefundRequest {
            refund_type: RefundType::Partial,
            items: vec![
                RefundLineInput {
                    order_item_id: ITEM.to_string(),
                    quantity: 1,
                },
                RefundLineInput {
                    order_item_id: ITEM.to_string(),
                    quantity: 2,
                },
            ],
            reason: None,
        };
        assert!(matches!(
            validate_refund_request(&duplicate),
            Err(ValidationError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_validate_adjustment() {
        assert!(validate_adjustment(-3).is_ok());
        assert!(validate_adjustment(3).is_ok());
        assert!(validate_adjustment(0).is_err());
    }

    #[test]
    fn test_validate_payment_amount() {
        assert!(validate_payment_amount(1).is_ok());
        assert!(validate_payment_amount(0).is_err());
        assert!(validate_payment_amount(-100).is_err());
        assert!(validate_payment_amount(i64::MAX).is_err());
    }

    #[test]
    fn test_prices_and_amounts_are_bounded() {
        assert!(validate_price_cents("unit_price", MAX_PRICE_CENTS).is_ok());
        assert!(matches!(
            validate_price_cents("unit_price", MAX_PRICE_CENTS + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_amount_cents("tax", MAX_AMOUNT_CENTS).is_ok());
        assert!(validate_amount_cents("tax", i64::MAX).is_err());

        let order = NewOrder {
            customer_id: None,
            items: vec![line(3, 4_000_000_000_000_000_000)],
            discounts: vec![],
            tax_cents: 0,
            notes: None,
        };
        assert!(matches!(
            validate_new_order(&order),
            Err(ValidationError::OutOfRange { .. })
        ));
    }
}
