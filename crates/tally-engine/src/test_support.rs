//! Fixtures shared by the engine tests.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};

use crate::catalog::NewProduct;
use crate::engine::{Engine, TenantSession};
use crate::ledger::Receipt;
use tally_core::{FixedClock, InventoryEntry, NewBatch, NewEntry, NewOrder, OrderLineInput, Product};
use tally_db::{Database, DbConfig};

pub struct Shop {
    pub engine: Engine,
    pub session: TenantSession,
    pub clock: Arc<FixedClock>,
    pub supplier_id: String,
}

/// In-memory engine with one business, one supplier and a clock pinned to
/// 2026-03-01 12:00 UTC.
pub async fn shop() -> Shop {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    engine_shop(db).await
}

pub async fn engine_shop(db: Database) -> Shop {
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()));
    let engine = Engine::new(db).with_clock(clock.clone());

    let business = engine.register_business("Corner Shop").await.unwrap();
    let session = engine.for_tenant(&business.id, "clerk-1");
    let supplier = session
        .register_supplier("Acme Wholesale", Some("orders@acme.test".to_string()))
        .await
        .unwrap();

    Shop {
        engine,
        session,
        clock,
        supplier_id: supplier.id,
    }
}

pub async fn product(session: &TenantSession, sku: &str) -> Product {
    session
        .register_product(NewProduct {
            sku: sku.to_string(),
            name: format!("Product {}", sku),
            reorder_threshold: 5,
        })
        .await
        .unwrap()
}

pub fn new_entry(product_id: &str, quantity: i64, expiry: Option<(i32, u32, u32)>) -> NewEntry {
    NewEntry {
        product_id: product_id.to_string(),
        cost_price_cents: 250,
        selling_price_cents: 400,
        quantity,
        expiry_date: expiry.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
    }
}

/// Receives one batch holding a single entry and returns the entry.
pub async fn stock(
    shop: &Shop,
    product_id: &str,
    quantity: i64,
    expiry: Option<(i32, u32, u32)>,
) -> InventoryEntry {
    let receipt: Receipt = shop
        .session
        .receive(
            NewBatch {
                supplier_id: shop.supplier_id.clone(),
                reference: None,
            },
            vec![new_entry(product_id, quantity, expiry)],
        )
        .await
        .unwrap();
    receipt.entries.into_iter().next().unwrap()
}

pub fn line(product_id: &str, quantity: i64, unit_price_cents: i64) -> OrderLineInput {
    OrderLineInput {
        product_id: product_id.to_string(),
        quantity,
        unit_price_cents,
        discount_cents: 0,
    }
}

pub fn order(items: Vec<OrderLineInput>) -> NewOrder {
    NewOrder {
        customer_id: None,
        items,
        discounts: Vec::new(),
        tax_cents: 0,
        notes: None,
    }
}
