//! # Catalogue Registration
//!
//! The records the ledger refers to: suppliers, customers, products and
//! discounts. Kept minimal; these exist so that every reference an
//! operation receives can be checked against the same business.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::Action;
use crate::engine::TenantSession;
use crate::error::EngineResult;
use tally_core::validation::{validate_discount_input, validate_id, validate_name, validate_sku};
use tally_core::{
    Customer, Discount, DiscountInput, DiscountKind, DiscountScope, Product, Supplier,
    ValidationError,
};

/// A product to add to the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub reorder_threshold: i64,
}

/// A discount to register with its validity window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDiscount {
    pub name: String,
    pub kind: DiscountKind,
    /// Basis points for percentage, cents for fixed.
    pub value: i64,
    pub scope: DiscountScope,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl TenantSession {
    pub async fn register_supplier(&self, name: &str, contact: Option<String>) -> EngineResult<Supplier> {
        self.authorize(Action::ManageCatalog)?;
        validate_name("supplier name", name)?;

        let supplier = Supplier {
            id: Uuid::new_v4().to_string(),
            business_id: self.business_id().to_string(),
            name: name.trim().to_string(),
            contact,
            created_at: self.now(),
        };

        let mut tx = self.begin().await?;
        tx.suppliers().insert(&supplier).await?;
        tx.commit().await?;

        info!(supplier_id = %supplier.id, "Supplier registered");
        Ok(supplier)
    }

    pub async fn register_customer(&self, name: &str, email: Option<String>) -> EngineResult<Customer> {
        self.authorize(Action::ManageCatalog)?;
        validate_name("customer name", name)?;

        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            business_id: self.business_id().to_string(),
            name: name.trim().to_string(),
            email,
            created_at: self.now(),
        };

        let mut tx = self.begin().await?;
        tx.customers().insert(&customer).await?;
        tx.commit().await?;

        info!(customer_id = %customer.id, "Customer registered");
        Ok(customer)
    }

    /// Adds a product with no stock. Stock arrives by receiving batches.
    ///
    /// Fails with a `Duplicate` validation error when the SKU is taken
    /// within the business.
    pub async fn register_product(&self, input: NewProduct) -> EngineResult<Product> {
        self.authorize(Action::ManageCatalog)?;
        validate_sku(&input.sku)?;
        validate_name("product name", &input.name)?;
        if input.reorder_threshold < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "reorder_threshold".to_string(),
            }
            .into());
        }

        let now = self.now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            business_id: self.business_id().to_string(),
            sku: input.sku.trim().to_string(),
            name: input.name.trim().to_string(),
            reorder_threshold: input.reorder_threshold,
            quantity: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.begin().await?;
        tx.products().insert(&product).await?;
        tx.commit().await?;

        info!(product_id = %product.id, sku = %product.sku, "Product registered");
        Ok(product)
    }

    pub async fn register_discount(&self, input: NewDiscount) -> EngineResult<Discount> {
        self.authorize(Action::ManageCatalog)?;
        validate_name("discount name", &input.name)?;
        validate_discount_input(&DiscountInput {
            discount_id: None,
            kind: input.kind,
            value: input.value,
        })?;
        if let Some(ends_at) = input.ends_at {
            if ends_at < input.starts_at {
                return Err(ValidationError::unusable(
                    "ends_at",
                    ends_at.to_rfc3339(),
                    "ends before the discount starts",
                )
                .into());
            }
        }

        let discount = Discount {
            id: Uuid::new_v4().to_string(),
            business_id: self.business_id().to_string(),
            name: input.name.trim().to_string(),
            kind: input.kind,
            value: input.value,
            scope: input.scope,
            starts_at: input.starts_at,
            ends_at: input.ends_at,
            is_active: true,
            created_at: self.now(),
        };

        let mut tx = self.begin().await?;
        tx.discounts().insert(&discount).await?;
        tx.commit().await?;

        info!(discount_id = %discount.id, kind = ?discount.kind, value = discount.value, "Discount registered");
        Ok(discount)
    }

    pub async fn get_product(&self, product_id: &str) -> EngineResult<Product> {
        self.authorize(Action::ViewInventory)?;
        validate_id("product_id", product_id)?;
        let mut tx = self.begin().await?;
        let product = tx.products().get(product_id).await?;
        tx.commit().await?;
        Ok(product)
    }
}
