//! One capture run: the block store plus the global order over it.

use std::collections::HashSet;

use crate::capture::fingerprint::BlockId;
use crate::capture::reconcile::{Discovered, OrderReconciler};
use crate::capture::store::{BlockStore, ContentUnit};
use crate::error::{Error, Result};

/// Store and global order owned by a single capture run.
///
/// The order is only ever changed through [`OrderReconciler::merge`]; it holds
/// no duplicate id and every id in it is present in the store.
#[derive(Debug, Clone, Default)]
pub struct CaptureSession {
    ordered_ids: Vec<BlockId>,
    store: BlockStore,
}

impl CaptureSession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a converted unit. No-op if its id is already stored.
    ///
    /// Returns `true` when the unit was newly inserted.
    pub fn upsert(&mut self, unit: ContentUnit) -> bool {
        self.store.upsert(unit).1
    }

    /// Whether `id` is already stored.
    pub fn contains(&self, id: &BlockId) -> bool {
        self.store.contains(id)
    }

    /// Merge a discovery batch into the global order.
    ///
    /// Ids without a stored unit are ignored, so the order never references a
    /// dropped block.
    pub fn absorb(&mut self, batch: &[Discovered]) {
        let stored: Vec<Discovered> = batch
            .iter()
            .copied()
            .filter(|found| self.store.contains(&found.id))
            .collect();
        self.ordered_ids = OrderReconciler::merge(&self.ordered_ids, &stored, &self.store);
    }

    /// Ids in document order.
    pub fn ordered_ids(&self) -> &[BlockId] {
        &self.ordered_ids
    }

    /// The block store.
    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    /// Units in document order.
    pub fn ordered_units(&self) -> impl Iterator<Item = &ContentUnit> {
        self.ordered_ids.iter().filter_map(|id| self.store.get(id))
    }

    /// Number of stored units.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Verify the order/store invariants.
    pub fn check_invariants(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.ordered_ids.len());
        for id in &self.ordered_ids {
            if !seen.insert(*id) {
                return Err(Error::Assembly(format!("block {} ordered twice", id)));
            }
            if !self.store.contains(id) {
                return Err(Error::Assembly(format!("ordered block {} missing from store", id)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::{BlockKind, Fragment, TrailingSpacing};

    fn unit(raw: u64, position: f64) -> ContentUnit {
        ContentUnit::new(
            BlockId::from_raw(raw),
            BlockKind::Paragraph,
            position,
            Fragment::new(format!("p{}", raw), TrailingSpacing::BlankLine),
        )
    }

    #[test]
    fn test_double_upsert_keeps_one_slot() {
        let mut session = CaptureSession::new();
        for _ in 0..2 {
            session.upsert(unit(7, 32.0));
            session.absorb(&[Discovered::new(BlockId::from_raw(7), 32.0)]);
        }
        assert_eq!(session.len(), 1);
        assert_eq!(session.ordered_ids().len(), 1);
        assert!(session.check_invariants().is_ok());
    }

    #[test]
    fn test_unstored_ids_are_not_ordered() {
        let mut session = CaptureSession::new();
        session.upsert(unit(1, 0.0));
        session.absorb(&[
            Discovered::new(BlockId::from_raw(1), 0.0),
            Discovered::new(BlockId::from_raw(2), 8.0),
        ]);
        assert_eq!(session.ordered_ids(), &[BlockId::from_raw(1)]);
    }

    #[test]
    fn test_ordered_units_follow_position() {
        let mut session = CaptureSession::new();
        session.upsert(unit(2, 80.0));
        session.upsert(unit(1, 16.0));
        session.absorb(&[
            Discovered::new(BlockId::from_raw(2), 80.0),
            Discovered::new(BlockId::from_raw(1), 16.0),
        ]);
        let texts: Vec<_> = session.ordered_units().map(|u| u.fragment.text.as_str()).collect();
        assert_eq!(texts, vec!["p1", "p2"]);
    }
}
