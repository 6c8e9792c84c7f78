//! Document snapshots and an in-memory virtualizing viewport.
//!
//! A [`DocumentSnapshot`] describes a whole document as absolutely positioned
//! blocks. [`VirtualizedDocument`] replays it the way a virtualized host does:
//! only blocks near the viewport are materialized, every query hands out new
//! node handles, and measured positions may drift slightly between queries.
//!
//! # Snapshot format
//!
//! ```json
//! {
//!   "identity": "https://notes.example/p/1",
//!   "viewport_height": 400,
//!   "overscan": 40,
//!   "blocks": [
//!     { "top": 0, "markers": [{"heading": 1}], "lines": [{"runs": [{"text": "Title"}]}] },
//!     { "top": 48, "height": 64, "markers": ["quote"], "children": [
//!       { "top": 48, "markers": ["text"], "lines": [{"runs": [{"text": "quoted"}]}] }
//!     ]}
//!   ]
//! }
//! ```

use std::cell::Cell;
use std::future::{ready, Future};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capture::DocumentIdentity;
use crate::error::{Error, Result};
use crate::tree::{BlockAttrs, BlockMarker, Line, RenderedBlock, ScrollMetrics, Viewport};

fn default_height() -> f64 {
    24.0
}

fn default_scrollable() -> bool {
    true
}

/// One block of a snapshot, positioned relative to the document top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotBlock {
    /// Top edge in document coordinates
    pub top: f64,
    /// Rendered height
    #[serde(default = "default_height")]
    pub height: f64,
    /// Structural markers
    #[serde(default)]
    pub markers: Vec<BlockMarker>,
    /// Visual lines
    #[serde(default)]
    pub lines: Vec<Line>,
    /// Kind-specific attributes
    #[serde(default)]
    pub attrs: BlockAttrs,
    /// Nested blocks, materialized together with this one
    #[serde(default)]
    pub children: Vec<SnapshotBlock>,
}

impl SnapshotBlock {
    /// Create a block at `top` with the given markers.
    pub fn new(top: f64, markers: Vec<BlockMarker>) -> Self {
        Self {
            top,
            height: default_height(),
            markers,
            lines: Vec::new(),
            attrs: BlockAttrs::default(),
            children: Vec::new(),
        }
    }

    /// Append an unstyled line.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.lines.push(Line::plain(text));
        self
    }

    /// Append a line.
    pub fn with_line(mut self, line: Line) -> Self {
        self.lines.push(line);
        self
    }

    /// Replace the attributes.
    pub fn with_attrs(mut self, attrs: BlockAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Set the rendered height.
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    /// Nest a block.
    pub fn with_child(mut self, child: SnapshotBlock) -> Self {
        self.children.push(child);
        self
    }

    fn bottom(&self) -> f64 {
        self.children
            .iter()
            .map(SnapshotBlock::bottom)
            .fold(self.top + self.height, f64::max)
    }
}

/// A complete document, serializable as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Document address
    pub identity: String,
    /// Visible height of the scroll region
    pub viewport_height: f64,
    /// Extra distance above and below the viewport that stays materialized
    #[serde(default)]
    pub overscan: f64,
    /// Whether the document has a scroll region at all
    #[serde(default = "default_scrollable")]
    pub scrollable: bool,
    /// Maximum layout drift applied to measured positions, alternating in sign
    #[serde(default)]
    pub jitter: f64,
    /// Scroll offset the document is opened at
    #[serde(default)]
    pub initial_scroll: f64,
    /// Top-level blocks in document order
    #[serde(default)]
    pub blocks: Vec<SnapshotBlock>,
}

impl DocumentSnapshot {
    /// Create an empty scrollable snapshot.
    pub fn new(identity: impl Into<String>, viewport_height: f64) -> Self {
        Self {
            identity: identity.into(),
            viewport_height,
            overscan: 0.0,
            scrollable: true,
            jitter: 0.0,
            initial_scroll: 0.0,
            blocks: Vec::new(),
        }
    }

    /// Parse and validate a snapshot from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Load and validate a snapshot from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Append a top-level block.
    pub fn with_block(mut self, block: SnapshotBlock) -> Self {
        self.blocks.push(block);
        self
    }

    /// Set the overscan distance.
    pub fn with_overscan(mut self, overscan: f64) -> Self {
        self.overscan = overscan;
        self
    }

    /// Set the position drift.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Set the opening scroll offset.
    pub fn with_initial_scroll(mut self, offset: f64) -> Self {
        self.initial_scroll = offset;
        self
    }

    /// Remove the scroll region.
    pub fn non_scrollable(mut self) -> Self {
        self.scrollable = false;
        self
    }

    /// Document identity.
    pub fn document_identity(&self) -> DocumentIdentity {
        DocumentIdentity::new(self.identity.clone())
    }

    /// Check geometric consistency.
    pub fn validate(&self) -> Result<()> {
        if self.viewport_height <= 0.0 || !self.viewport_height.is_finite() {
            return Err(Error::Snapshot(format!(
                "viewport_height must be positive, got {}",
                self.viewport_height
            )));
        }
        if self.overscan < 0.0 || self.jitter < 0.0 {
            return Err(Error::Snapshot("overscan and jitter must not be negative".to_string()));
        }
        fn check(block: &SnapshotBlock) -> Result<()> {
            if block.height < 0.0 || !block.top.is_finite() {
                return Err(Error::Snapshot(format!("invalid block geometry at {}", block.top)));
            }
            block.children.iter().try_for_each(check)
        }
        self.blocks.iter().try_for_each(check)
    }

    /// Open the snapshot as a virtualizing viewport.
    pub fn into_document(self) -> VirtualizedDocument {
        VirtualizedDocument::new(self)
    }
}

/// In-memory [`Viewport`] replaying a [`DocumentSnapshot`].
#[derive(Debug)]
pub struct VirtualizedDocument {
    snapshot: DocumentSnapshot,
    scroll_top: f64,
    next_handle: Cell<u64>,
    queries: Cell<u64>,
    settles: Vec<Duration>,
    scroll_log: Vec<f64>,
}

impl VirtualizedDocument {
    /// Open `snapshot` at its initial scroll offset.
    pub fn new(snapshot: DocumentSnapshot) -> Self {
        let mut document = Self {
            scroll_top: 0.0,
            snapshot,
            next_handle: Cell::new(1),
            queries: Cell::new(0),
            settles: Vec::new(),
            scroll_log: Vec::new(),
        };
        document.scroll_top = document.clamp(document.snapshot.initial_scroll);
        document
    }

    /// Document identity.
    pub fn identity(&self) -> DocumentIdentity {
        self.snapshot.document_identity()
    }

    /// Current scroll offset.
    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    /// Total content height.
    pub fn content_height(&self) -> f64 {
        self.snapshot
            .blocks
            .iter()
            .map(SnapshotBlock::bottom)
            .fold(0.0, f64::max)
    }

    /// Settle delays requested so far.
    pub fn settles(&self) -> &[Duration] {
        &self.settles
    }

    /// Every offset the document was scrolled to, in order.
    pub fn scroll_log(&self) -> &[f64] {
        &self.scroll_log
    }

    /// Insert a top-level block, keeping document order (simulates a live edit).
    pub fn insert_block(&mut self, block: SnapshotBlock) {
        let index = self
            .snapshot
            .blocks
            .iter()
            .position(|existing| existing.top > block.top)
            .unwrap_or(self.snapshot.blocks.len());
        self.snapshot.blocks.insert(index, block);
    }

    fn clamp(&self, top: f64) -> f64 {
        let max = (self.content_height() - self.snapshot.viewport_height).max(0.0);
        top.clamp(0.0, max)
    }

    fn fresh_handle(&self) -> u64 {
        let handle = self.next_handle.get();
        self.next_handle.set(handle + 1);
        handle
    }

    fn materialize(
        &self,
        block: &SnapshotBlock,
        parent: Option<u64>,
        drift: f64,
        out: &mut Vec<RenderedBlock>,
    ) {
        let handle = self.fresh_handle();
        out.push(RenderedBlock {
            handle,
            parent,
            top: block.top - self.scroll_top + drift,
            markers: block.markers.clone(),
            lines: block.lines.clone(),
            attrs: block.attrs.clone(),
        });
        for child in &block.children {
            self.materialize(child, Some(handle), drift, out);
        }
    }
}

impl Viewport for VirtualizedDocument {
    fn scroll_metrics(&self) -> Option<ScrollMetrics> {
        if !self.snapshot.scrollable {
            return None;
        }
        Some(ScrollMetrics {
            scroll_top: self.scroll_top,
            scroll_height: self.content_height().max(self.snapshot.viewport_height),
            client_height: self.snapshot.viewport_height,
        })
    }

    fn scroll_to(&mut self, top: f64) {
        if !self.snapshot.scrollable {
            return;
        }
        self.scroll_top = self.clamp(top);
        self.scroll_log.push(self.scroll_top);
    }

    fn materialized(&self) -> Vec<RenderedBlock> {
        let query = self.queries.get();
        self.queries.set(query + 1);
        let drift = if query % 2 == 0 {
            self.snapshot.jitter
        } else {
            -self.snapshot.jitter
        };

        let (start, end) = if self.snapshot.scrollable {
            (
                self.scroll_top - self.snapshot.overscan,
                self.scroll_top + self.snapshot.viewport_height + self.snapshot.overscan,
            )
        } else {
            (f64::NEG_INFINITY, f64::INFINITY)
        };

        let mut out = Vec::new();
        for block in &self.snapshot.blocks {
            if block.top < end && block.bottom() > start {
                self.materialize(block, None, drift, &mut out);
            }
        }
        out
    }

    fn settle(&mut self, delay: Duration) -> impl Future<Output = ()> {
        self.settles.push(delay);
        ready(())
    }
}
