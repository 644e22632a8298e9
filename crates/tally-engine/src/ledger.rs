//! # Batch Ledger
//!
//! Received stock: batches from suppliers and the priced entries inside
//! them, and the choice of which entries a deduction draws from.
//!
//! ## Receiving
//! ```text
//! receive(NewBatch, [NewEntry...])
//!     │
//!     ├── supplier must belong to the business
//!     ├── every product must belong to the business and be active
//!     │
//!     ├── INSERT batch (open)
//!     ├── INSERT entry per line   quantity_on_hand = quantity_received
//!     └── products.quantity += quantity per line
//! ```
//!
//! Receiving is not a movement: an entry's live quantity is its received
//! quantity plus the signed sum of its movements.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::Action;
use crate::engine::TenantSession;
use crate::error::{EngineError, EngineResult};
use tally_core::allocation::{plan_deduction, EntryAllocation};
use tally_core::validation::{validate_id, validate_new_entries, validate_quantity};
use tally_core::{Batch, BatchStatus, InventoryEntry, NewBatch, NewEntry, ValidationError};
use tally_db::TenantTx;

/// A received batch and its entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub batch: Batch,
    pub entries: Vec<InventoryEntry>,
}

impl TenantSession {
    /// Creates an open batch and its entries.
    ///
    /// Fails with `Validation` on negative prices or quantities, before
    /// anything is written.
    pub async fn receive(&self, batch: NewBatch, entries: Vec<NewEntry>) -> EngineResult<Receipt> {
        self.authorize(Action::ReceiveStock)?;
        validate_id("supplier_id", &batch.supplier_id)?;
        validate_new_entries(&entries)?;

        let (batch, entries) = (&batch, &entries);
        self.retrying("receive", move || self.receive_once(batch, entries))
            .await
    }

    async fn receive_once(&self, input: &NewBatch, entries: &[NewEntry]) -> EngineResult<Receipt> {
        let now = self.now();
        let mut tx = self.begin().await?;

        tx.suppliers().get(&input.supplier_id).await?;

        let batch = Batch {
            id: Uuid::new_v4().to_string(),
            business_id: self.business_id().to_string(),
            supplier_id: input.supplier_id.clone(),
            reference: input.reference.clone(),
            status: BatchStatus::Open,
            created_by: self.user_id().to_string(),
            received_at: now,
            closed_at: None,
        };
        tx.batches().insert(&batch).await?;

        let entries = self.insert_entries(&mut tx, &batch, entries).await?;
        tx.commit().await?;

        info!(
            batch_id = %batch.id,
            entries = entries.len(),
            units = entries.iter().map(|e| e.quantity_received).sum::<i64>(),
            "Batch received"
        );
        Ok(Receipt { batch, entries })
    }

    /// Adds entries to a batch that is still open.
    pub async fn receive_into(&self, batch_id: &str, entries: Vec<NewEntry>) -> EngineResult<Vec<InventoryEntry>> {
        self.authorize(Action::ReceiveStock)?;
        validate_id("batch_id", batch_id)?;
        validate_new_entries(&entries)?;

        let entries = &entries;
        self.retrying("receive_into", move || async move {
            let mut tx = self.begin().await?;

            let batch = tx.batches().get(batch_id).await?;
            if batch.status == BatchStatus::Closed {
                return Err(ValidationError::unusable("batch_id", batch_id, "batch is closed").into());
            }

            let added = self.insert_entries(&mut tx, &batch, entries).await?;
            tx.commit().await?;

            info!(batch_id = %batch_id, entries = added.len(), "Entries added to batch");
            Ok(added)
        })
        .await
    }

    /// Closes a batch to further receiving. Its remaining stock can still
    /// be sold. Closing a closed batch returns it unchanged.
    pub async fn close_batch(&self, batch_id: &str) -> EngineResult<Batch> {
        self.authorize(Action::CloseBatch)?;
        validate_id("batch_id", batch_id)?;

        self.retrying("close_batch", move || async move {
            let mut tx = self.begin().await?;

            let batch = tx.batches().get(batch_id).await?;
            if batch.status == BatchStatus::Closed {
                return Ok(batch);
            }

            tx.batches().close(batch_id, self.now()).await?;
            let closed = tx.batches().get(batch_id).await?;
            tx.commit().await?;

            info!(batch_id = %batch_id, "Batch closed");
            Ok(closed)
        })
        .await
    }

    /// Entries received in a batch, in creation order.
    pub async fn batch_entries(&self, batch_id: &str) -> EngineResult<Vec<InventoryEntry>> {
        self.authorize(Action::ViewInventory)?;
        validate_id("batch_id", batch_id)?;

        let mut tx = self.begin().await?;
        tx.batches().get(batch_id).await?;
        let entries = tx.entries().for_batch(batch_id).await?;
        tx.commit().await?;
        Ok(entries)
    }

    /// Plans which entries `quantity` units of a product would be drawn
    /// from, earliest expiry first, then oldest received, then creation
    /// order. Nothing is written.
    pub async fn select_entries_for_deduction(
        &self,
        product_id: &str,
        quantity: i64,
    ) -> EngineResult<Vec<EntryAllocation>> {
        self.authorize(Action::ViewInventory)?;
        validate_id("product_id", product_id)?;
        validate_quantity("quantity", quantity)?;

        let mut tx = self.begin().await?;
        let plan = select_in_tx(&mut tx, product_id, quantity).await?;
        tx.commit().await?;
        Ok(plan)
    }

    async fn insert_entries(
        &self,
        tx: &mut TenantTx,
        batch: &Batch,
        entries: &[NewEntry],
    ) -> EngineResult<Vec<InventoryEntry>> {
        let now = self.now();
        let mut inserted = Vec::with_capacity(entries.len());

        for input in entries {
            let product = tx.products().get(&input.product_id).await?;
            if !product.is_active {
                return Err(ValidationError::unusable("product_id", &product.id, "product is inactive").into());
            }

            let entry = InventoryEntry {
                id: Uuid::new_v4().to_string(),
                seq: 0,
                business_id: self.business_id().to_string(),
                batch_id: batch.id.clone(),
                product_id: input.product_id.clone(),
                cost_price_cents: input.cost_price_cents,
                selling_price_cents: input.selling_price_cents,
                quantity_received: input.quantity,
                quantity_on_hand: input.quantity,
                expiry_date: input.expiry_date,
                received_at: now,
                version: 0,
            };
            let entry = tx.entries().insert(&entry).await?;
            tx.products().add_quantity(&entry.product_id, entry.quantity_received, now).await?;
            inserted.push(entry);
        }

        Ok(inserted)
    }
}

/// Plans a deduction against the entries visible in `tx`.
///
/// The product is looked up first so that a foreign or unknown product
/// fails as such rather than as a stock shortage.
pub(crate) async fn select_in_tx(
    tx: &mut TenantTx,
    product_id: &str,
    quantity: i64,
) -> EngineResult<Vec<EntryAllocation>> {
    tx.products().get(product_id).await?;
    let candidates = tx.entries().candidates(product_id).await?;
    plan_deduction(product_id, quantity, &candidates).map_err(EngineError::from)
}

// =============================================================================
// Unit Tests
// =============================================================================
