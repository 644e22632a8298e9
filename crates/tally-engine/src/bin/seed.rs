//! Seeds a demo business: a supplier, a few products and one received
//! batch. Reads the same `TALLY_*` environment as the engine.
//!
//! ```text
//! TALLY_DB_PATH=demo.db cargo run -p tally-engine --bin seed
//! ```

use chrono::{Duration, Utc};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tally_core::{NewBatch, NewEntry};
use tally_engine::{Engine, EngineConfig, NewProduct};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally=debug,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();

    let config = EngineConfig::from_env()?;
    info!(path = %config.database_path.display(), "Seeding database");

    let engine = Engine::connect(&config).await?;
    let business = engine.register_business("Demo Corner Shop").await?;
    let session = engine.for_tenant(&business.id, "seed");

    let supplier = session
        .register_supplier("Acme Wholesale", Some("orders@acme.example".to_string()))
        .await?;

    let catalogue = [
        ("RICE-5KG", "Basmati Rice 5kg", 10, 850, 1299, 60, Some(365)),
        ("TEA-100", "Black Tea 100 bags", 12, 210, 399, 120, Some(540)),
        ("MILK-1L", "Whole Milk 1L", 24, 65, 119, 48, Some(10)),
        ("SOAP-BAR", "Olive Soap Bar", 6, 90, 199, 30, None),
    ];

    let today = Utc::now().date_naive();
    let mut entries = Vec::with_capacity(catalogue.len());
    for (sku, name, threshold, cost, price, quantity, shelf_days) in catalogue {
        let product = session
            .register_product(NewProduct {
                sku: sku.to_string(),
                name: name.to_string(),
                reorder_threshold: threshold,
            })
            .await?;

        entries.push(NewEntry {
            product_id: product.id,
            cost_price_cents: cost,
            selling_price_cents: price,
            quantity,
            expiry_date: shelf_days.map(|days| today + Duration::days(days)),
        });
    }

    let receipt = session
        .receive(
            NewBatch {
                supplier_id: supplier.id,
                reference: Some("DN-0001".to_string()),
            },
            entries,
        )
        .await?;

    info!(
        business_id = %business.id,
        batch_id = %receipt.batch.id,
        entries = receipt.entries.len(),
        "Demo data ready"
    );

    engine.database().close().await;
    Ok(())
}
