//! # vdom_capture
//!
//! Reconstructs complete, ordered Markdown documents from virtualized UI trees
//! that only ever materialize one viewport's worth of content.
//!
//! ## Core Features
//!
//! - **Revelation loop**: scroll-driven state machine with an adaptive settle delay
//! - **Content identity**: blocks are fingerprinted from a text prefix and a
//!   coarse position bucket, so recreated nodes collapse into one unit
//! - **Global order**: discovery batches are merged by position, never appended
//! - **Block conversion**: one priority-ordered classifier, one converter per kind
//!   (headings, paragraphs, lists, todos, quotes, callouts, code, bookmarks,
//!   dividers, images) with shared inline styling
//! - **Assembly**: per-kind spacing rules and blank-line normalization
//!
//! ## Architecture
//!
//! ```text
//! Viewport --> RevelationDriver --> extract_pass --> BlockStore + OrderReconciler
//!                                                          |
//!                                      DocumentAssembler <-+--> text
//! ```
//!
//! Hosts implement [`tree::Viewport`] over their own tree. The
//! [`snapshot::VirtualizedDocument`] implementation replays a JSON snapshot
//! and backs the `capture_snapshot` binary.
//!
//! ## Quick Start
//!
//! ```
//! use vdom_capture::capture::{CaptureEngine, DocumentIdentity};
//! use vdom_capture::config::CaptureConfig;
//! use vdom_capture::snapshot::{DocumentSnapshot, SnapshotBlock};
//! use vdom_capture::tree::BlockMarker;
//!
//! # fn main() -> vdom_capture::Result<()> {
//! let mut snapshot = DocumentSnapshot::new("https://notes.example/p/7", 120.0);
//! for i in 0..20 {
//!     snapshot = snapshot.with_block(
//!         SnapshotBlock::new(i as f64 * 32.0, vec![BlockMarker::BulletList])
//!             .with_text(format!("item {}", i)),
//!     );
//! }
//! let identity = snapshot.document_identity();
//! let mut document = snapshot.into_document();
//!
//! let engine = CaptureEngine::new(identity, CaptureConfig::default())?;
//! let runtime = tokio::runtime::Builder::new_current_thread().build()?;
//! let report = runtime.block_on(engine.start_capture(&mut document))?;
//!
//! assert_eq!(report.text.lines().count(), 20);
//! assert!(report.text.starts_with("- item 0\n- item 1"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Input boundary
pub mod tree;

// Block classification and conversion
pub mod converters;

// Capture engine
pub mod capture;
pub mod assembler;

// Snapshot-backed viewport
pub mod snapshot;

// Re-exports
pub use assembler::DocumentAssembler;
pub use capture::{
    CaptureEngine, CapturePhase, CaptureReport, CaptureSession, CaptureStats, CaptureWarning,
    DocumentIdentity,
};
pub use config::CaptureConfig;
pub use converters::{BlockKind, Fragment, TrailingSpacing};
pub use error::{Error, Result};
pub use tree::{RenderedBlock, Viewport};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
