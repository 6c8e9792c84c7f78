//! Block converters.
//!
//! Every materialized block is classified into exactly one [`BlockKind`] by a
//! single priority-ordered classifier, then converted by the function for that
//! kind into a [`Fragment`]: Markdown text plus the spacing it requires after it.
//!
//! Classification priority:
//! 1. Headings (levels 1-6)
//! 2. List items: todo, ordered, bullet
//! 3. Containers: callout, quote (they also own their nested blocks)
//! 4. Leaves: code, bookmark, divider, image, paragraph
//!
//! Blocks matching none of these are dropped.
//!
//! # Examples
//!
//! ```
//! use vdom_capture::converters::{classify, BlockConverter, BlockKind};
//! use vdom_capture::tree::{BlockMarker, RenderedBlock};
//!
//! let block = RenderedBlock::new(1, 0.0)
//!     .with_marker(BlockMarker::Text)
//!     .with_marker(BlockMarker::Heading(2))
//!     .with_text("Setup");
//!
//! let kind = classify(&block).unwrap();
//! assert_eq!(kind, BlockKind::Heading(2));
//!
//! let fragment = BlockConverter::new().convert(kind, &block, &[]).unwrap();
//! assert_eq!(fragment.text, "## Setup");
//! ```

pub mod code;
pub mod inline;
pub mod markdown;
pub mod whitespace;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tree::{BlockMarker, RenderedBlock};

pub use markdown::BlockConverter;
pub use whitespace::{collapse_blank_lines, normalize_document, strip_zero_width};

/// Structural kind of a content unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Heading with level 1-6
    Heading(u8),
    /// Non-empty paragraph
    Paragraph,
    /// Paragraph without visible content
    EmptyParagraph,
    /// Fenced code block
    Code,
    /// Numbered list item
    OrderedItem,
    /// Bulleted list item
    BulletItem,
    /// Checkbox list item
    TodoItem {
        /// Checkbox state
        checked: bool,
    },
    /// Quote container
    Quote,
    /// Callout container
    Callout,
    /// Horizontal rule
    Divider,
    /// Link preview card
    Bookmark,
    /// Image placeholder
    Image,
}

impl BlockKind {
    /// Short name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Heading(_) => "heading",
            BlockKind::Paragraph => "paragraph",
            BlockKind::EmptyParagraph => "empty paragraph",
            BlockKind::Code => "code",
            BlockKind::OrderedItem => "ordered item",
            BlockKind::BulletItem => "bullet item",
            BlockKind::TodoItem { .. } => "todo item",
            BlockKind::Quote => "quote",
            BlockKind::Callout => "callout",
            BlockKind::Divider => "divider",
            BlockKind::Bookmark => "bookmark",
            BlockKind::Image => "image",
        }
    }

    /// Containers own the blocks nested inside them.
    pub fn is_container(&self) -> bool {
        matches!(self, BlockKind::Quote | BlockKind::Callout)
    }

    /// Kinds that must be separated from the preceding block by a blank line.
    pub fn needs_blank_before(&self) -> bool {
        matches!(
            self,
            BlockKind::Heading(_)
                | BlockKind::Paragraph
                | BlockKind::Quote
                | BlockKind::Callout
                | BlockKind::Divider
                | BlockKind::Image
        )
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Heading(level) => write!(f, "heading({})", level),
            other => f.write_str(other.name()),
        }
    }
}

/// Spacing a fragment requires after itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrailingSpacing {
    /// Nothing; the next block follows on the next line
    None,
    /// A single line break
    LineBreak,
    /// A blank line
    BlankLine,
}

impl TrailingSpacing {
    /// Text appended after the fragment.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrailingSpacing::None => "",
            TrailingSpacing::LineBreak => "\n",
            TrailingSpacing::BlankLine => "\n\n",
        }
    }
}

/// Converted text of one content unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Markdown text
    pub text: String,
    /// Spacing required after the text
    pub spacing: TrailingSpacing,
}

impl Fragment {
    /// Create a fragment.
    pub fn new(text: impl Into<String>, spacing: TrailingSpacing) -> Self {
        Self {
            text: text.into(),
            spacing,
        }
    }
}

/// Classify a rendered block by testing structural predicates in priority order.
///
/// Returns `None` for blocks the engine does not recognize.
pub fn classify(block: &RenderedBlock) -> Option<BlockKind> {
    if let Some(level) = block.markers.iter().find_map(|marker| match marker {
        BlockMarker::Heading(level) => Some(*level),
        _ => None,
    }) {
        return Some(BlockKind::Heading(level));
    }

    if block.has_marker(&BlockMarker::TodoList) {
        return Some(BlockKind::TodoItem {
            checked: block.attrs.checked.unwrap_or(false),
        });
    }
    if block.has_marker(&BlockMarker::OrderedList) {
        return Some(BlockKind::OrderedItem);
    }
    if block.has_marker(&BlockMarker::BulletList) {
        return Some(BlockKind::BulletItem);
    }

    if block.has_marker(&BlockMarker::Callout) {
        return Some(BlockKind::Callout);
    }
    if block.has_marker(&BlockMarker::Quote) {
        return Some(BlockKind::Quote);
    }

    if block.has_marker(&BlockMarker::Code) {
        return Some(BlockKind::Code);
    }
    if block.has_marker(&BlockMarker::Bookmark) {
        return Some(BlockKind::Bookmark);
    }
    if block.has_marker(&BlockMarker::Divider) {
        return Some(BlockKind::Divider);
    }
    if block.has_marker(&BlockMarker::Image) {
        return Some(BlockKind::Image);
    }
    if block.has_marker(&BlockMarker::Empty) {
        return Some(BlockKind::EmptyParagraph);
    }
    if block.has_marker(&BlockMarker::Text) {
        if strip_zero_width(&block.plain_text()).trim().is_empty() {
            return Some(BlockKind::EmptyParagraph);
        }
        return Some(BlockKind::Paragraph);
    }

    None
}
