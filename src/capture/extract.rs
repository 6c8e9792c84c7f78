//! A single extraction pass over the currently materialized blocks.

use std::collections::HashSet;

use crate::capture::fingerprint::{adjacent_fingerprints, fingerprint, BlockId};
use crate::capture::reconcile::Discovered;
use crate::capture::session::CaptureSession;
use crate::capture::store::ContentUnit;
use crate::config::FingerprintConfig;
use crate::converters::{classify, BlockConverter};
use crate::tree::RenderedBlock;

/// What one pass saw and stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractOutcome {
    /// Blocks materialized in the window
    pub materialized: usize,
    /// Recognized top-level units seen (new or already stored)
    pub discovered: usize,
    /// Units stored for the first time
    pub new_units: usize,
    /// Ids of units whose conversion failed
    pub dropped: Vec<BlockId>,
}

/// Fingerprint, convert and store every recognized block in `blocks`, then
/// merge the window into the session's global order.
///
/// Blocks nested in a quote or callout are consumed by their container and are
/// never processed on their own. Already stored ids are not converted again.
/// A conversion failure drops that unit only.
///
/// # Arguments
///
/// * `blocks` - Materialized blocks in tree order
/// * `scroll_top` - Scroll offset the blocks were measured at
/// * `session` - Session receiving the units
/// * `converter` - Block converter
/// * `fingerprint_config` - Identity parameters
pub fn extract_pass(
    blocks: &[RenderedBlock],
    scroll_top: f64,
    session: &mut CaptureSession,
    converter: &BlockConverter,
    fingerprint_config: &FingerprintConfig,
) -> ExtractOutcome {
    let mut outcome = ExtractOutcome {
        materialized: blocks.len(),
        ..Default::default()
    };
    let mut consumed: HashSet<u64> = HashSet::new();
    let mut batch: Vec<Discovered> = Vec::new();

    for (index, block) in blocks.iter().enumerate() {
        if block.parent.is_some_and(|parent| consumed.contains(&parent)) {
            consumed.insert(block.handle);
            continue;
        }

        let Some(kind) = classify(block) else {
            log::trace!("Skipping unrecognized block {:?}", block.markers);
            continue;
        };

        let descendants: &[RenderedBlock] = if kind.is_container() {
            consumed.insert(block.handle);
            let count = descendant_count(block.handle, &blocks[index + 1..]);
            &blocks[index + 1..index + 1 + count]
        } else {
            &[]
        };

        let mut identity_text = block.plain_text();
        for nested in descendants {
            identity_text.push(' ');
            identity_text.push_str(&nested.plain_text());
        }

        let position = scroll_top + block.top;
        let id = stored_identity(&identity_text, position, session, fingerprint_config);
        outcome.discovered += 1;

        if session.contains(&id) {
            batch.push(Discovered::new(id, position));
            continue;
        }

        match converter.convert(kind, block, descendants) {
            Ok(fragment) => {
                session.upsert(ContentUnit::new(id, kind, position, fragment));
                outcome.new_units += 1;
                batch.push(Discovered::new(id, position));
            },
            Err(e) => {
                log::warn!("Dropping block {} at {:.1}: {}", id, position, e);
                outcome.dropped.push(id);
            },
        }
    }

    session.absorb(&batch);
    outcome
}

/// Identity of a block, reusing a stored id from an adjacent bucket when the
/// measured position drifted across a bucket edge.
fn stored_identity(
    text: &str,
    position: f64,
    session: &CaptureSession,
    config: &FingerprintConfig,
) -> BlockId {
    let id = fingerprint(text, position, config);
    if session.contains(&id) {
        return id;
    }
    adjacent_fingerprints(text, position, config)
        .into_iter()
        .find(|neighbour| session.contains(neighbour))
        .unwrap_or(id)
}

/// Number of blocks at the start of `following` that sit (transitively) inside `container`.
fn descendant_count(container: u64, following: &[RenderedBlock]) -> usize {
    let mut ancestors: HashSet<u64> = HashSet::from([container]);
    following
        .iter()
        .take_while(|block| match block.parent {
            Some(parent) if ancestors.contains(&parent) => {
                ancestors.insert(block.handle);
                true
            },
            _ => false,
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::BlockMarker;

    fn paragraph(handle: u64, top: f64, text: &str) -> RenderedBlock {
        RenderedBlock::new(handle, top)
            .with_marker(BlockMarker::Text)
            .with_text(text)
    }

    fn run(
        blocks: &[RenderedBlock],
        scroll_top: f64,
        session: &mut CaptureSession,
    ) -> ExtractOutcome {
        extract_pass(
            blocks,
            scroll_top,
            session,
            &BlockConverter::new(),
            &FingerprintConfig::default(),
        )
    }

    #[test]
    fn test_recreated_nodes_dedup() {
        let mut session = CaptureSession::new();
        let blocks = [paragraph(1, 100.0, "alpha"), paragraph(2, 200.0, "beta")];
        let first = run(&blocks, 0.0, &mut session);
        assert_eq!(first.new_units, 2);

        // Same blocks, new handles, measured after scrolling by 80px
        let blocks = [paragraph(7, 20.0, "alpha"), paragraph(8, 120.0, "beta")];
        let second = run(&blocks, 80.0, &mut session);
        assert_eq!(second.discovered, 2);
        assert_eq!(second.new_units, 0);
        assert_eq!(session.len(), 2);
        assert_eq!(session.ordered_ids().len(), 2);
    }

    #[test]
    fn test_drift_across_bucket_edge_dedups() {
        let mut session = CaptureSession::new();
        let blocks = [paragraph(1, 36.3, "edge"), paragraph(2, 76.3, "next")];
        run(&blocks, 0.0, &mut session);
        let first = session.ordered_ids().to_vec();

        let blocks = [paragraph(3, 35.7, "edge"), paragraph(4, 75.7, "next")];
        let outcome = run(&blocks, 0.0, &mut session);
        assert_eq!(outcome.new_units, 0);
        assert_eq!(session.ordered_ids(), first.as_slice());
    }

    #[test]
    fn test_container_consumes_descendants() {
        let blocks = vec![
            RenderedBlock::new(1, 0.0).with_marker(BlockMarker::Quote),
            paragraph(2, 0.0, "inside").nested_in(1),
            paragraph(3, 16.0, "deeper").nested_in(2),
            paragraph(4, 48.0, "outside"),
        ];
        let mut session = CaptureSession::new();
        let outcome = run(&blocks, 0.0, &mut session);
        assert_eq!(outcome.new_units, 2);

        let texts: Vec<_> = session.ordered_units().map(|u| u.fragment.text.clone()).collect();
        assert_eq!(texts, vec!["> inside".to_string(), "outside".to_string()]);
    }

    #[test]
    fn test_conversion_failure_drops_unit_only() {
        let mut broken = paragraph(1, 0.0, "one");
        broken.markers = vec![BlockMarker::OrderedList];
        broken.attrs.counter = Some("•".to_string());

        let mut session = CaptureSession::new();
        let outcome = run(&[broken, paragraph(2, 40.0, "two")], 0.0, &mut session);
        assert_eq!(outcome.dropped.len(), 1);
        assert_eq!(outcome.new_units, 1);
        assert_eq!(session.ordered_ids().len(), 1);
        assert!(session.check_invariants().is_ok());
    }

    #[test]
    fn test_unrecognized_blocks_ignored() {
        let mut session = CaptureSession::new();
        let other = RenderedBlock::new(1, 0.0)
            .with_marker(BlockMarker::Other("table".into()))
            .with_text("cell");
        let outcome = run(&[other], 0.0, &mut session);
        assert_eq!(outcome.materialized, 1);
        assert_eq!(outcome.discovered, 0);
        assert!(session.is_empty());
    }

    #[test]
    fn test_descendant_count_stops_at_sibling() {
        let following = vec![
            paragraph(2, 0.0, "a").nested_in(1),
            paragraph(3, 0.0, "b").nested_in(2),
            paragraph(4, 0.0, "c"),
            paragraph(5, 0.0, "d").nested_in(1),
        ];
        assert_eq!(descendant_count(1, &following), 2);
    }
}
