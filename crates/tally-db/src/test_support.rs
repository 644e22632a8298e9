//! Fixtures shared by the repository tests.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::pool::Database;
use tally_core::{Batch, BatchStatus, InventoryEntry, Product, Supplier};

pub async fn seed_business(db: &Database, name: &str) -> String {
    db.businesses().create(name, Utc::now()).await.unwrap().id
}

pub fn product(business_id: &str, sku: &str) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4().to_string(),
        business_id: business_id.to_string(),
        sku: sku.to_string(),
        name: format!("Product {}", sku),
        reorder_threshold: 0,
        quantity: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Creates a supplier, a product and an open batch; returns
/// `(product_id, batch_id)`.
pub async fn seed_stock_refs(db: &Database, business_id: &str) -> (String, String) {
    let now = Utc::now();
    let supplier = Supplier {
        id: Uuid::new_v4().to_string(),
        business_id: business_id.to_string(),
        name: "Acme Wholesale".to_string(),
        contact: None,
        created_at: now,
    };
    let product = product(business_id, "SKU-STOCK");
    let batch = Batch {
        id: Uuid::new_v4().to_string(),
        business_id: business_id.to_string(),
        supplier_id: supplier.id.clone(),
        reference: Some("DN-1".to_string()),
        status: BatchStatus::Open,
        created_by: "tester".to_string(),
        received_at: now,
        closed_at: None,
    };

    let mut tx = db.tenant(business_id).begin().await.unwrap();
    tx.suppliers().insert(&supplier).await.unwrap();
    tx.products().insert(&product).await.unwrap();
    tx.batches().insert(&batch).await.unwrap();
    tx.commit().await.unwrap();

    (product.id, batch.id)
}

pub fn entry(
    business_id: &str,
    batch_id: &str,
    product_id: &str,
    quantity: i64,
    expiry: Option<(i32, u32, u32)>,
) -> InventoryEntry {
    InventoryEntry {
        id: Uuid::new_v4().to_string(),
        seq: 0,
        business_id: business_id.to_string(),
        batch_id: batch_id.to_string(),
        product_id: product_id.to_string(),
        cost_price_cents: 250,
        selling_price_cents: 400,
        quantity_received: quantity,
        quantity_on_hand: quantity,
        expiry_date: expiry.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        received_at: Utc::now(),
        version: 0,
    }
}
