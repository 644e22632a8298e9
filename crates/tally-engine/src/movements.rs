//! # Stock Movements
//!
//! Every change to an entry's quantity after receiving is one immutable
//! movement, written in the same transaction as the entry update and the
//! product cache update.
//!
//! ## Posting
//! ```text
//! post(entry, In/Out/Adjustment, qty)
//!     │
//!     ├── read entry (version v, on_hand h)
//!     ├── signed = type.signed(qty)
//!     ├── h + signed < 0 ──────────────► InsufficientStock { entry_id }
//!     │
//!     ├── UPDATE entry ... WHERE version = v AND h + signed >= 0
//!     ├── INSERT movement (sequence assigned by the log)
//!     └── products.quantity += signed
//! ```
//!
//! ## Reading Back
//! [`MovementHistory`] replays an entry's movements in sequence order, a
//! page at a time, each page in its own short read. It can be restarted and
//! replays the same movements, plus any appended since.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::Action;
use crate::engine::TenantSession;
use crate::error::{EngineError, EngineResult};
use tally_core::validation::{validate_adjustment, validate_id, validate_quantity};
use tally_core::{InventoryMovement, MovementReason, MovementType, Product};
use tally_db::{TenantScope, TenantTx};

/// Movements fetched per page of history.
pub const HISTORY_PAGE_SIZE: i64 = 100;

// =============================================================================
// Posting
// =============================================================================

/// One movement to post against an entry.
#[derive(Debug, Clone)]
pub(crate) struct Posting<'a> {
    pub entry_id: &'a str,
    /// Magnitude for In/Out, signed for Adjustment.
    pub quantity: i64,
    pub movement_type: MovementType,
    pub reason: MovementReason,
    pub reference_id: Option<&'a str>,
    pub note: Option<&'a str>,
}

/// Applies a movement to its entry and the product cache inside `tx`.
pub(crate) async fn post(
    tx: &mut TenantTx,
    posting: Posting<'_>,
    created_by: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> EngineResult<InventoryMovement> {
    let entry = tx.entries().get(posting.entry_id).await?;
    let signed = posting.movement_type.signed(posting.quantity);

    if entry.quantity_on_hand + signed < 0 {
        return Err(EngineError::InsufficientStock {
            product_id: entry.product_id.clone(),
            entry_id: Some(entry.id.clone()),
            requested: -signed,
            available: entry.quantity_on_hand,
        });
    }

    tx.entries().apply_delta(&entry, signed).await?;

    let movement = InventoryMovement {
        sequence: 0,
        id: Uuid::new_v4().to_string(),
        business_id: tx.business_id().to_string(),
        entry_id: entry.id.clone(),
        product_id: entry.product_id.clone(),
        movement_type: posting.movement_type,
        quantity: signed,
        reason: posting.reason,
        reference_id: posting.reference_id.map(str::to_string),
        note: posting.note.map(str::to_string),
        created_by: Some(created_by.to_string()),
        created_at: now,
    };
    let movement = tx.movements().insert(&movement).await?;
    tx.products().add_quantity(&entry.product_id, signed, now).await?;

    Ok(movement)
}

// =============================================================================
// Audit Records
// =============================================================================

/// Result of checking one entry against its movement log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryAudit {
    pub entry_id: String,
    pub quantity_received: i64,
    /// Signed sum of the entry's movements.
    pub movement_sum: i64,
    /// quantity_received + movement_sum.
    pub derived: i64,
    /// quantity_on_hand as stored.
    pub materialized: i64,
    pub consistent: bool,
}

/// Result of rebuilding a product's cached quantity from its entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductReconciliation {
    pub product_id: String,
    pub cached_before: i64,
    pub live: i64,
    /// Whether the cache had drifted and was rewritten.
    pub corrected: bool,
}

// =============================================================================
// Session Operations
// =============================================================================

impl TenantSession {
    /// Records a manual movement against an entry.
    ///
    /// `In`/`Out` take a positive quantity; `Adjustment` takes a non-zero
    /// signed quantity. An `Out` or negative adjustment larger than the
    /// entry's live quantity fails with `InsufficientStock` and writes
    /// nothing.
    pub async fn record_movement(
        &self,
        entry_id: &str,
        quantity: i64,
        movement_type: MovementType,
        reference_id: Option<&str>,
    ) -> EngineResult<InventoryMovement> {
        self.authorize(Action::RecordMovement)?;
        validate_id("entry_id", entry_id)?;
        match movement_type {
            MovementType::In | MovementType::Out => validate_quantity("quantity", quantity)?,
            MovementType::Adjustment => validate_adjustment(quantity)?,
        }

        let movement = self
            .retrying("record_movement", move || async move {
                let mut tx = self.begin().await?;
                let movement = post(
                    &mut tx,
                    Posting {
                        entry_id,
                        quantity,
                        movement_type,
                        reason: MovementReason::Adjustment,
                        reference_id,
                        note: None,
                    },
                    self.user_id(),
                    self.now(),
                )
                .await?;
                tx.commit().await?;
                Ok(movement)
            })
            .await?;

        info!(
            entry_id = %entry_id,
            movement_type = ?movement.movement_type,
            quantity = movement.quantity,
            sequence = movement.sequence,
            "Movement recorded"
        );
        Ok(movement)
    }

    /// Stock correction with an explanatory note (count differences,
    /// damage, shrinkage).
    pub async fn adjust(&self, entry_id: &str, quantity: i64, note: &str) -> EngineResult<InventoryMovement> {
        self.authorize(Action::RecordMovement)?;
        validate_id("entry_id", entry_id)?;
        validate_adjustment(quantity)?;

        self.retrying("adjust", move || async move {
            let mut tx = self.begin().await?;
            let movement = post(
                &mut tx,
                Posting {
                    entry_id,
                    quantity,
                    movement_type: MovementType::Adjustment,
                    reason: MovementReason::Adjustment,
                    reference_id: None,
                    note: Some(note),
                },
                self.user_id(),
                self.now(),
            )
            .await?;
            tx.commit().await?;

            info!(entry_id = %entry_id, quantity, note = %note, "Stock adjusted");
            Ok(movement)
        })
        .await
    }

    /// Lazy, restartable replay of an entry's movements in sequence order.
    pub fn history(&self, entry_id: &str) -> EngineResult<MovementHistory> {
        self.authorize(Action::ViewInventory)?;
        validate_id("entry_id", entry_id)?;
        Ok(MovementHistory::new(self.scope().clone(), entry_id.to_string(), HISTORY_PAGE_SIZE))
    }

    /// Movements written on behalf of an order item (sale, cancel, refund).
    ///
    /// Another business's item fails with `TenantMismatch`.
    pub async fn movements_for_reference(&self, order_item_id: &str) -> EngineResult<Vec<InventoryMovement>> {
        self.authorize(Action::ViewInventory)?;
        validate_id("order_item_id", order_item_id)?;

        let mut tx = self.begin().await?;
        tx.orders().get_item(order_item_id).await?;
        let movements = tx.movements().for_reference(order_item_id).await?;
        tx.commit().await?;
        Ok(movements)
    }

    /// Checks that an entry's stored quantity equals its received quantity
    /// plus the signed sum of its movements.
    pub async fn audit_entry(&self, entry_id: &str) -> EngineResult<EntryAudit> {
        self.authorize(Action::ViewInventory)?;
        validate_id("entry_id", entry_id)?;

        let mut tx = self.begin().await?;
        let entry = tx.entries().get(entry_id).await?;
        let movement_sum = tx.movements().signed_sum(entry_id).await?;
        tx.commit().await?;

        let derived = entry.quantity_received + movement_sum;
        let audit = EntryAudit {
            entry_id: entry.id,
            quantity_received: entry.quantity_received,
            movement_sum,
            derived,
            materialized: entry.quantity_on_hand,
            consistent: derived == entry.quantity_on_hand,
        };

        if !audit.consistent {
            warn!(
                entry_id = %audit.entry_id,
                derived = audit.derived,
                materialized = audit.materialized,
                "Entry quantity does not match its movement log"
            );
        }
        Ok(audit)
    }

    /// Rebuilds a product's cached quantity from its entries.
    pub async fn reconcile_product(&self, product_id: &str) -> EngineResult<ProductReconciliation> {
        self.authorize(Action::RecordMovement)?;
        validate_id("product_id", product_id)?;

        self.retrying("reconcile_product", move || async move {
            let mut tx = self.begin().await?;
            let product = tx.products().get(product_id).await?;
            let live = tx.products().live_quantity(product_id).await?;

            let corrected = live != product.quantity;
            if corrected {
                warn!(
                    product_id = %product_id,
                    cached = product.quantity,
                    live,
                    "Product quantity cache drifted, rewriting"
                );
                tx.products().set_quantity(product_id, live, self.now()).await?;
            }
            tx.commit().await?;

            Ok(ProductReconciliation {
                product_id: product.id,
                cached_before: product.quantity,
                live,
                corrected,
            })
        })
        .await
    }

    /// Active products at or below their reorder threshold.
    pub async fn low_stock_products(&self) -> EngineResult<Vec<Product>> {
        self.authorize(Action::ViewInventory)?;

        let mut tx = self.begin().await?;
        let products = tx.products().low_stock().await?;
        tx.commit().await?;
        Ok(products)
    }
}

// =============================================================================
// History Cursor
// =============================================================================

/// Pages through one entry's movements in sequence order.
///
/// ```rust,ignore
/// let mut history = session.history(&entry_id)?;
/// while let Some(movement) = history.next().await? {
///     println!("{} {}", movement.sequence, movement.quantity);
/// }
/// history.restart();
/// ```
#[derive(Debug)]
pub struct MovementHistory {
    scope: TenantScope,
    entry_id: String,
    page_size: i64,
    last_sequence: i64,
    buffer: VecDeque<InventoryMovement>,
    exhausted: bool,
    checked: bool,
}

impl MovementHistory {
    fn new(scope: TenantScope, entry_id: String, page_size: i64) -> Self {
        MovementHistory {
            scope,
            entry_id,
            page_size: page_size.max(1),
            last_sequence: 0,
            buffer: VecDeque::new(),
            exhausted: false,
            checked: false,
        }
    }

    /// Smaller pages; mostly useful to exercise paging.
    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    /// Next movement, or `None` once the log is exhausted.
    ///
    /// The first call fails with `NotFound`/`TenantMismatch` if the entry is
    /// not visible to the business.
    pub async fn next(&mut self) -> EngineResult<Option<InventoryMovement>> {
        if self.buffer.is_empty() && !self.exhausted {
            self.fetch_page().await?;
        }

        match self.buffer.pop_front() {
            Some(movement) => {
                self.last_sequence = movement.sequence;
                Ok(Some(movement))
            }
            None => Ok(None),
        }
    }

    /// Starts over from the first movement.
    pub fn restart(&mut self) {
        self.last_sequence = 0;
        self.buffer.clear();
        self.exhausted = false;
    }

    /// Drains the rest of the history into a vector.
    pub async fn collect_remaining(&mut self) -> EngineResult<Vec<InventoryMovement>> {
        let mut all = Vec::new();
        while let Some(movement) = self.next().await? {
            all.push(movement);
        }
        Ok(all)
    }

    async fn fetch_page(&mut self) -> EngineResult<()> {
        let mut tx = self.scope.begin().await?;
        if !self.checked {
            tx.entries().get(&self.entry_id).await?;
            self.checked = true;
        }

        let after = self.buffer.back().map_or(self.last_sequence, |m| m.sequence);
        let page = tx.movements().page(&self.entry_id, after, self.page_size).await?;
        tx.commit().await?;

        debug!(entry_id = %self.entry_id, after, fetched = page.len(), "Fetched movement page");
        if (page.len() as i64) < self.page_size {
            self.exhausted = true;
        }
        self.buffer.extend(page);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{product, shop, stock};
    use tally_core::ValidationError;

    #[tokio::test]
    async fn test_movements_keep_entry_and_log_in_step() {
        let shop = shop().await;
        let rice = product(&shop.session, "RICE").await;
        let entry = stock(&shop, &rice.id, 50, None).await;

        shop.session
            .record_movement(&entry.id, 12, MovementType::Out, None)
            .await
            .unwrap();
        shop.session
            .record_movement(&entry.id, 2, MovementType::In, None)
            .await
            .unwrap();
        let adj = shop.session.adjust(&entry.id, -3, "damaged in storage").await.unwrap();
        assert_eq!(adj.quantity, -3);
        assert_eq!(adj.note.as_deref(), Some("damaged in storage"));

        let audit = shop.session.audit_entry(&entry.id).await.unwrap();
        assert_eq!(audit.movement_sum, -13);
        assert_eq!(audit.derived, 37);
        assert_eq!(audit.materialized, 37);
        assert!(audit.consistent);

        assert_eq!(shop.session.get_product(&rice.id).await.unwrap().quantity, 37);
    }

    #[tokio::test]
    async fn test_out_below_zero_writes_nothing() {
        let shop = shop().await;
        let rice = product(&shop.session, "RICE").await;
        let entry = stock(&shop, &rice.id, 5, None).await;

        let err = shop
            .session
            .record_movement(&entry.id, 6, MovementType::Out, None)
            .await
            .unwrap_err();
        match err {
            EngineError::InsufficientStock {
                entry_id,
                requested,
                available,
                ..
            } => {
                assert_eq!(entry_id.as_deref(), Some(entry.id.as_str()));
                assert_eq!(requested, 6);
                assert_eq!(available, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let mut history = shop.session.history(&entry.id).unwrap();
        assert!(history.next().await.unwrap().is_none());
        assert_eq!(shop.session.get_product(&rice.id).await.unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn test_zero_and_negative_quantities_rejected() {
        let shop = shop().await;
        let rice = product(&shop.session, "RICE").await;
        let entry = stock(&shop, &rice.id, 5, None).await;

        let err = shop
            .session
            .record_movement(&entry.id, 0, MovementType::In, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(ValidationError::MustBePositive { .. })));

        let err = shop.session.adjust(&entry.id, 0, "nothing").await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(ValidationError::OutOfRange { .. })));
    }

    #[tokio::test]
    async fn test_history_pages_and_replays() {
        let shop = shop().await;
        let rice = product(&shop.session, "RICE").await;
        let entry = stock(&shop, &rice.id, 100, None).await;
        let other = stock(&shop, &rice.id, 100, None).await;

        for i in 1..=5 {
            shop.session
                .record_movement(&entry.id, i, MovementType::Out, None)
                .await
                .unwrap();
            // Interleaved movements on another entry must not show up
            shop.session
                .record_movement(&other.id, 1, MovementType::Out, None)
                .await
                .unwrap();
        }

        let mut history = shop.session.history(&entry.id).unwrap().with_page_size(2);
        let first = history.collect_remaining().await.unwrap();
        let quantities: Vec<i64> = first.iter().map(|m| m.quantity).collect();
        assert_eq!(quantities, vec![-1, -2, -3, -4, -5]);
        assert!(first.windows(2).all(|w| w[0].sequence < w[1].sequence));

        history.restart();
        let second = history.collect_remaining().await.unwrap();
        assert_eq!(first, second);

        // Movements appended later are picked up on the next replay
        shop.session.adjust(&entry.id, 4, "recount").await.unwrap();
        history.restart();
        assert_eq!(history.collect_remaining().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_history_of_foreign_entry() {
        let shop = shop().await;
        let rice = product(&shop.session, "RICE").await;
        let entry = stock(&shop, &rice.id, 10, None).await;

        let other = shop.engine.register_business("Other Shop").await.unwrap();
        let outsider = shop.engine.for_tenant(&other.id, "clerk-9");

        let mut history = outsider.history(&entry.id).unwrap();
        let err = history.next().await.unwrap_err();
        assert!(matches!(err, EngineError::TenantMismatch { .. }));
    }

    #[tokio::test]
    async fn test_reconcile_rewrites_drifted_cache() {
        let shop = shop().await;
        let rice = product(&shop.session, "RICE").await;
        stock(&shop, &rice.id, 30, None).await;

        let clean = shop.session.reconcile_product(&rice.id).await.unwrap();
        assert!(!clean.corrected);
        assert_eq!(clean.live, 30);

        sqlx::query("UPDATE products SET quantity = 999 WHERE id = ?1")
            .bind(&rice.id)
            .execute(shop.engine.database().pool())
            .await
            .unwrap();

        let fixed = shop.session.reconcile_product(&rice.id).await.unwrap();
        assert!(fixed.corrected);
        assert_eq!(fixed.cached_before, 999);
        assert_eq!(fixed.live, 30);
        assert_eq!(shop.session.get_product(&rice.id).await.unwrap().quantity, 30);
    }

    #[tokio::test]
    async fn test_low_stock_products() {
        let shop = shop().await;
        let rice = product(&shop.session, "RICE").await;
        let tea = product(&shop.session, "TEA").await;
        stock(&shop, &rice.id, 4, None).await;
        stock(&shop, &tea.id, 40, None).await;

        let low = shop.session.low_stock_products().await.unwrap();
        let skus: Vec<&str> = low.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(skus, vec!["RICE"]);
    }
}
