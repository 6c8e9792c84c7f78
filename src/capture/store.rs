//! Storage for revealed content units.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::capture::fingerprint::BlockId;
use crate::converters::{BlockKind, Fragment};

/// One structural block discovered in the tree, converted once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentUnit {
    /// Content fingerprint
    pub id: BlockId,
    /// Structural kind
    pub kind: BlockKind,
    /// Document-relative offset at first discovery
    pub raw_position: f64,
    /// Converted text, cached
    pub fragment: Fragment,
    /// Discovery order within the store, assigned on insertion
    pub sequence: u64,
}

impl ContentUnit {
    /// Create a unit; the store assigns the sequence number on insertion.
    pub fn new(id: BlockId, kind: BlockKind, raw_position: f64, fragment: Fragment) -> Self {
        Self {
            id,
            kind,
            raw_position,
            fragment,
            sequence: 0,
        }
    }
}

/// Mapping from block id to its unit, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct BlockStore {
    units: IndexMap<BlockId, ContentUnit>,
}

impl BlockStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `unit` unless its id is already present.
    ///
    /// Returns the stored unit and whether it was newly inserted. When the id
    /// exists the call is a no-op and the existing unit is returned unchanged.
    pub fn upsert(&mut self, mut unit: ContentUnit) -> (&ContentUnit, bool) {
        let sequence = self.units.len() as u64;
        match self.units.entry(unit.id) {
            indexmap::map::Entry::Occupied(entry) => (entry.into_mut(), false),
            indexmap::map::Entry::Vacant(entry) => {
                unit.sequence = sequence;
                (entry.insert(unit), true)
            },
        }
    }

    /// Look up a unit.
    pub fn get(&self, id: &BlockId) -> Option<&ContentUnit> {
        self.units.get(id)
    }

    /// Whether `id` is stored.
    pub fn contains(&self, id: &BlockId) -> bool {
        self.units.contains_key(id)
    }

    /// Number of stored units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &ContentUnit> {
        self.units.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::TrailingSpacing;

    fn unit(raw: u64, position: f64, text: &str) -> ContentUnit {
        ContentUnit::new(
            BlockId::from_raw(raw),
            BlockKind::Paragraph,
            position,
            Fragment::new(text, TrailingSpacing::BlankLine),
        )
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mut store = BlockStore::new();
        let (_, inserted) = store.upsert(unit(1, 10.0, "first"));
        assert!(inserted);

        let (existing, inserted) = store.upsert(unit(1, 42.0, "changed"));
        assert!(!inserted);
        assert_eq!(existing.raw_position, 10.0);
        assert_eq!(existing.fragment.text, "first");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_sequence_follows_discovery() {
        let mut store = BlockStore::new();
        store.upsert(unit(5, 0.0, "a"));
        store.upsert(unit(3, 0.0, "b"));
        store.upsert(unit(5, 0.0, "a"));
        store.upsert(unit(9, 0.0, "c"));

        let sequences: Vec<_> = store.iter().map(|u| (u.id.as_u64(), u.sequence)).collect();
        assert_eq!(sequences, vec![(5, 0), (3, 1), (9, 2)]);
    }
}
