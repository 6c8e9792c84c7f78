//! Global ordering of discovered blocks.
//!
//! Reveal windows overlap and are not guaranteed to move strictly downwards
//! (reflow, sticky headers and the final jump to the end re-reveal earlier
//! content), so discovered ids are never appended blindly. Every batch is
//! merged with the previous order by position instead.
//!
//! The sort key of an id is:
//! 1. its recorded position in the store (first discovery wins), else its
//!    position in the batch, else `+inf`
//! 2. its discovery sequence in the store (`u64::MAX` when unknown)
//!
//! Remaining ties keep input order (old order first, then batch order), so a
//! merged order is already sorted and re-merging the same batch leaves it
//! untouched.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::capture::fingerprint::BlockId;
use crate::capture::store::BlockStore;

/// An id seen in the current reveal window, with its measured position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Discovered {
    /// Block id
    pub id: BlockId,
    /// Document-relative offset measured in this window
    pub position: f64,
}

impl Discovered {
    /// Create a discovery record.
    pub fn new(id: BlockId, position: f64) -> Self {
        Self { id, position }
    }
}

/// Merges discovery batches into a single total order.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderReconciler;

impl OrderReconciler {
    /// Merge `batch` into `old`.
    ///
    /// The result holds every id of `old` and `batch` exactly once, sorted by
    /// best known position. Merging is idempotent:
    /// `merge(merge(o, b), b) == merge(o, b)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use vdom_capture::capture::fingerprint::BlockId;
    /// use vdom_capture::capture::reconcile::{Discovered, OrderReconciler};
    /// use vdom_capture::capture::store::BlockStore;
    ///
    /// let (a, b, c) = (BlockId::from_raw(1), BlockId::from_raw(2), BlockId::from_raw(3));
    /// let store = BlockStore::new();
    ///
    /// let batch = [Discovered::new(a, 0.0), Discovered::new(c, 200.0)];
    /// let first = OrderReconciler::merge(&[], &batch, &store);
    /// let merged = OrderReconciler::merge(&first, &[Discovered::new(b, 100.0)], &store);
    /// assert_eq!(merged, vec![a, b, c]);
    /// ```
    pub fn merge(old: &[BlockId], batch: &[Discovered], store: &BlockStore) -> Vec<BlockId> {
        let mut batch_positions: HashMap<BlockId, f64> = HashMap::with_capacity(batch.len());
        for found in batch {
            batch_positions.entry(found.id).or_insert(found.position);
        }

        let mut union: Vec<BlockId> = Vec::with_capacity(old.len() + batch.len());
        let mut seen = HashSet::with_capacity(old.len() + batch.len());
        for id in old.iter().copied().chain(batch.iter().map(|found| found.id)) {
            if seen.insert(id) {
                union.push(id);
            }
        }

        let key = |id: &BlockId| -> (f64, u64) {
            match store.get(id) {
                Some(unit) => (unit.raw_position, unit.sequence),
                None => (
                    batch_positions.get(id).copied().unwrap_or(f64::INFINITY),
                    u64::MAX,
                ),
            }
        };

        // Stable sort: equal keys keep union order.
        union.sort_by(|a, b| {
            let (pos_a, seq_a) = key(a);
            let (pos_b, seq_b) = key(b);
            match pos_a.total_cmp(&pos_b) {
                Ordering::Equal => seq_a.cmp(&seq_b),
                other => other,
            }
        });

        union
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::store::ContentUnit;
    use crate::converters::{BlockKind, Fragment, TrailingSpacing};

    fn id(raw: u64) -> BlockId {
        BlockId::from_raw(raw)
    }

    fn store_with(entries: &[(u64, f64)]) -> BlockStore {
        let mut store = BlockStore::new();
        for (raw, position) in entries {
            store.upsert(ContentUnit::new(
                id(*raw),
                BlockKind::Paragraph,
                *position,
                Fragment::new("x", TrailingSpacing::BlankLine),
            ));
        }
        store
    }

    #[test]
    fn test_union_has_no_duplicates() {
        let store = BlockStore::new();
        let merged = OrderReconciler::merge(
            &[id(1), id(2)],
            &[
                Discovered::new(id(2), 10.0),
                Discovered::new(id(3), 20.0),
                Discovered::new(id(3), 20.0),
            ],
            &store,
        );
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_recorded_position_wins_over_remeasurement() {
        let store = store_with(&[(1, 0.0), (2, 100.0), (3, 200.0)]);
        let order = vec![id(1), id(2), id(3)];
        // B re-measured far below C: the stored position still applies
        let merged = OrderReconciler::merge(&order, &[Discovered::new(id(2), 350.0)], &store);
        assert_eq!(merged, order);
    }

    #[test]
    fn test_out_of_order_batches_are_sorted() {
        let store = store_with(&[(10, 500.0), (11, 600.0), (1, 0.0), (2, 100.0)]);
        let late = OrderReconciler::merge(
            &[],
            &[Discovered::new(id(10), 500.0), Discovered::new(id(11), 600.0)],
            &store,
        );
        let merged = OrderReconciler::merge(
            &late,
            &[Discovered::new(id(1), 0.0), Discovered::new(id(2), 100.0)],
            &store,
        );
        assert_eq!(merged, vec![id(1), id(2), id(10), id(11)]);
    }

    #[test]
    fn test_equal_positions_break_ties_by_discovery() {
        let store = store_with(&[(9, 40.0), (4, 40.0)]);
        let merged = OrderReconciler::merge(
            &[],
            &[Discovered::new(id(4), 40.0), Discovered::new(id(9), 40.0)],
            &store,
        );
        assert_eq!(merged, vec![id(9), id(4)]);
    }

    #[test]
    fn test_merge_twice_is_noop() {
        let store = store_with(&[(1, 0.0), (2, 50.0)]);
        let batch = [Discovered::new(id(2), 50.0), Discovered::new(id(3), 25.0)];
        let once = OrderReconciler::merge(&[id(1)], &batch, &store);
        let twice = OrderReconciler::merge(&once, &batch, &store);
        assert_eq!(once, twice);
        assert_eq!(once, vec![id(1), id(3), id(2)]);
    }
}
