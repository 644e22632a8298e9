//! # Stock Allocation
//!
//! Decides which entries a deduction draws from, and which entries a
//! reversal returns stock to.
//!
//! ## Deduction Order (FEFO with FIFO fallback)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Candidates for product P1 (live > 0)                                   │
//! │                                                                         │
//! │   E3  expiry 2026-02-01  received 2026-01-10  seq 3   ← 1st             │
//! │   E1  expiry 2026-03-01  received 2026-01-01  seq 1   ← 2nd             │
//! │   E4  expiry 2026-03-01  received 2026-01-01  seq 4   ← 3rd (seq tie)   │
//! │   E2  no expiry          received 2025-12-20  seq 2   ← 4th             │
//! │   E5  no expiry          received 2026-01-15  seq 5   ← 5th             │
//! │                                                                         │
//! │  Entries with an expiry date go first, earliest first. Entries without  │
//! │  one follow, oldest received first. Creation order breaks every tie,   │
//! │  so the same state always yields the same plan.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::InventoryEntry;

/// One slice of a deduction plan: take `quantity` units from `entry_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EntryAllocation {
    pub entry_id: String,
    pub batch_id: String,
    pub quantity: i64,
    pub cost_price_cents: i64,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
}

impl EntryAllocation {
    /// Cost of the allocated units.
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_price_cents).multiply_quantity(self.quantity)
    }
}

/// FEFO/FIFO ordering between two entries.
pub fn deduction_order(a: &InventoryEntry, b: &InventoryEntry) -> Ordering {
    let by_expiry = match (a.expiry_date, b.expiry_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_expiry
        .then_with(|| received_key(a.received_at).cmp(&received_key(b.received_at)))
        .then_with(|| a.seq.cmp(&b.seq))
}

fn received_key(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

/// Sorts entries into deduction order in place.
pub fn sort_for_deduction(entries: &mut [InventoryEntry]) {
    entries.sort_by(deduction_order);
}

/// Plans a deduction of `quantity` units of `product_id` from `candidates`.
///
/// Entries of other products and entries with no live stock are skipped.
/// Fails with `InsufficientStock` (reporting the total available) when the
/// candidates cannot cover the request; nothing is partially planned.
///
/// ## Example
/// ```rust,ignore
/// let plan = plan_deduction("P1", 30, &entries)?;
/// assert_eq!(plan[0].quantity, 30);
/// ```
pub fn plan_deduction(
    product_id: &str,
    quantity: i64,
    candidates: &[InventoryEntry],
) -> CoreResult<Vec<EntryAllocation>> {
    let mut usable: Vec<&InventoryEntry> = candidates
        .iter()
        .filter(|e| e.product_id == product_id && e.quantity_on_hand > 0)
        .collect();
    usable.sort_by(|a, b| deduction_order(a, b));

    let available: i64 = usable.iter().map(|e| e.quantity_on_hand).sum();
    if available < quantity {
        return Err(CoreError::InsufficientStock {
            product_id: product_id.to_string(),
            entry_id: None,
            requested: quantity,
            available,
        });
    }

    let mut remaining = quantity;
    let mut plan = Vec::new();
    for entry in usable {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(entry.quantity_on_hand);
        plan.push(EntryAllocation {
            entry_id: entry.id.clone(),
            batch_id: entry.batch_id.clone(),
            quantity: take,
            cost_price_cents: entry.cost_price_cents,
            expiry_date: entry.expiry_date,
        });
        remaining -= take;
    }

    Ok(plan)
}

// =============================================================================
// Reversals
// =============================================================================

/// Units of an order item drawn from one entry and not yet returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawnSlice {
    pub entry_id: String,
    /// Sequence of the first OUT movement against this entry for the item.
    pub first_sequence: i64,
    /// Units drawn minus units already returned.
    pub outstanding: i64,
}

/// Plans where `quantity` returned units go: the most recently drawn entry
/// first, never more than its outstanding units.
///
/// Returns `(entry_id, quantity)` pairs. Fails with `InsufficientStock`
/// style data only if the slices cannot absorb the quantity, which means
/// the movement log and the order item disagree.
pub fn plan_reversal(
    product_id: &str,
    quantity: i64,
    slices: &[DrawnSlice],
) -> CoreResult<Vec<(String, i64)>> {
    let mut ordered: Vec<&DrawnSlice> = slices.iter().filter(|s| s.outstanding > 0).collect();
    ordered.sort_by(|a, b| b.first_sequence.cmp(&a.first_sequence));

    let outstanding: i64 = ordered.iter().map(|s| s.outstanding).sum();
    if outstanding < quantity {
        return Err(CoreError::InsufficientStock {
            product_id: product_id.to_string(),
            entry_id: None,
            requested: quantity,
            available: outstanding,
        });
    }

    let mut remaining = quantity;
    let mut plan = Vec::new();
    for slice in ordered {
        if remaining == 0 {
            break;
        }
        let give = remaining.min(slice.outstanding);
        plan.push((slice.entry_id.clone(), give));
        remaining -= give;
    }

    Ok(plan)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(id: &str, seq: i64, on_hand: i64, expiry: Option<(i32, u32, u32)>, received_day: u32) -> InventoryEntry {
        InventoryEntry {
            id: id.to_string(),
            seq,
            business_id: "B1".to_string(),
            batch_id: format!("batch-{}", id),
            product_id: "P1".to_string(),
            cost_price_cents: 100 * seq,
            selling_price_cents: 500,
            quantity_received: on_hand,
            quantity_on_hand: on_hand,
            expiry_date: expiry.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            received_at: Utc.with_ymd_and_hms(2026, 1, received_day, 9, 0, 0).unwrap(),
            version: 0,
        }
    }

    #[test]
    fn test_fefo_then_fifo_then_seq() {
        let mut entries = vec![
            entry("E5", 5, 10, None, 15),
            entry("E2", 2, 10, None, 1),
            entry("E4", 4, 10, Some((2026, 3, 1)), 1),
            entry("E1", 1, 10, Some((2026, 3, 1)), 1),
            entry("E3", 3, 10, Some((2026, 2, 1)), 10),
        ];
        sort_for_deduction(&mut entries);
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["E3", "E1", "E4", "E2", "E5"]);
    }

    #[test]
    fn test_plan_single_entry() {
        let entries = vec![entry("E1", 1, 100, None, 1)];
        let plan = plan_deduction("P1", 30, &entries).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].entry_id, "E1");
        assert_eq!(plan[0].quantity, 30);
    }

    #[test]
    fn test_plan_spans_entries_in_order() {
        let entries = vec![
            entry("E1", 1, 5, None, 2),
            entry("E2", 2, 5, Some((2026, 6, 1)), 3),
        ];
        let plan = plan_deduction("P1", 8, &entries).unwrap();
        assert_eq!(
            plan.iter().map(|a| (a.entry_id.as_str(), a.quantity)).collect::<Vec<_>>(),
            vec![("E2", 5), ("E1", 3)]
        );
        assert_eq!(plan[0].cost().cents(), 1000);
    }

    #[test]
    fn test_plan_exact_remaining_and_one_more() {
        let entries = vec![entry("E1", 1, 70, None, 1)];
        assert!(plan_deduction("P1", 70, &entries).is_ok());

        let err = plan_deduction("P1", 71, &entries).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                product_id: "P1".to_string(),
                entry_id: None,
                requested: 71,
                available: 70,
            }
        );
    }

    #[test]
    fn test_plan_skips_empty_and_foreign_entries() {
        let mut other = entry("X1", 9, 50, None, 1);
        other.product_id = "P2".to_string();
        let entries = vec![entry("E1", 1, 0, Some((2026, 1, 2)), 1), other, entry("E2", 2, 4, None, 1)];
        let plan = plan_deduction("P1", 4, &entries).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].entry_id, "E2");
    }

    #[test]
    fn test_plan_is_deterministic() {
        let entries = vec![
            entry("E1", 1, 3, None, 1),
            entry("E2", 2, 3, None, 1),
            entry("E3", 3, 3, None, 1),
        ];
        let first = plan_deduction("P1", 7, &entries).unwrap();
        let second = plan_deduction("P1", 7, &entries).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.last().map(|a| a.quantity), Some(1));
    }

    #[test]
    fn test_plan_reversal_latest_first() {
        let slices = vec![
            DrawnSlice {
                entry_id: "E1".to_string(),
                first_sequence: 10,
                outstanding: 3,
            },
            DrawnSlice {
                entry_id: "E2".to_string(),
                first_sequence: 11,
                outstanding: 2,
            },
        ];
        let plan = plan_reversal("P1", 4, &slices).unwrap();
        assert_eq!(plan, vec![("E2".to_string(), 2), ("E1".to_string(), 2)]);

        assert!(plan_reversal("P1", 6, &slices).is_err());
    }
}
