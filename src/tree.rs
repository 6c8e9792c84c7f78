//! Structural content tree exposed by a virtualized host.
//!
//! The host materializes only the blocks near its viewport and recreates them
//! freely, so nothing in this module carries a stable identity: a
//! [`RenderedBlock`] describes one node *as measured right now*.
//!
//! Identity is derived later from content and position (see
//! [`crate::capture::fingerprint`]).

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Scroll state of the host's scrollable region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollMetrics {
    /// Current scroll offset from the top of the content
    pub scroll_top: f64,
    /// Total height of the scrollable content
    pub scroll_height: f64,
    /// Visible height of the region
    pub client_height: f64,
}

impl ScrollMetrics {
    /// Largest offset the region can scroll to.
    pub fn max_offset(&self) -> f64 {
        (self.scroll_height - self.client_height).max(0.0)
    }

    /// Whether the viewport sits within `tolerance` pixels of the end.
    pub fn is_at_end(&self, tolerance: f64) -> bool {
        self.scroll_top >= self.max_offset() - tolerance
    }
}

/// A scrollable, virtualizing view over a document.
///
/// Implementations are read-only data sources that mutate on their own: the
/// engine never assumes two calls to [`materialized`](Viewport::materialized)
/// return the same nodes.
pub trait Viewport {
    /// Scroll state of the scrollable region, or `None` if the document has none.
    fn scroll_metrics(&self) -> Option<ScrollMetrics>;

    /// Move the scrollable region to `top` (clamped by the host).
    fn scroll_to(&mut self, top: f64);

    /// Blocks currently materialized, in tree order.
    ///
    /// Nested blocks follow their container and reference it through
    /// [`RenderedBlock::parent`].
    fn materialized(&self) -> Vec<RenderedBlock>;

    /// Wait for the host to finish rendering after a viewport move.
    fn settle(&mut self, delay: Duration) -> impl Future<Output = ()>;
}

/// Structural marker carried by a rendered node.
///
/// A node may carry several markers (a heading is usually also a text block);
/// the classifier in [`crate::converters::classify`] resolves them by priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockMarker {
    /// Generic text block
    Text,
    /// Text block flagged as empty by the host
    Empty,
    /// Heading with its level
    Heading(u8),
    /// Numbered list item
    OrderedList,
    /// Bulleted list item
    BulletList,
    /// Checkbox list item
    TodoList,
    /// Quote container
    Quote,
    /// Callout container
    Callout,
    /// Code block
    Code,
    /// Horizontal rule
    Divider,
    /// Link preview card
    Bookmark,
    /// Image
    Image,
    /// Any marker the engine does not understand
    Other(String),
}

/// One styled run of inline text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InlineRun {
    /// Visible text
    pub text: String,
    /// Bold
    pub bold: bool,
    /// Italic
    pub italic: bool,
    /// Strikethrough
    pub strikethrough: bool,
    /// Underline
    pub underline: bool,
    /// Inline code (suppresses every other style)
    pub code: bool,
    /// Highlight color, if highlighted
    pub highlight: Option<String>,
    /// Hyperlink target, if the run is part of a link
    pub link: Option<String>,
}

impl InlineRun {
    /// Unstyled run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Mark the run bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Mark the run italic.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Mark the run struck through.
    pub fn strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }

    /// Mark the run underlined.
    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Mark the run as inline code.
    pub fn code(mut self) -> Self {
        self.code = true;
        self
    }

    /// Highlight the run.
    pub fn highlighted(mut self, color: impl Into<String>) -> Self {
        self.highlight = Some(color.into());
        self
    }

    /// Attach a hyperlink.
    pub fn linked(mut self, href: impl Into<String>) -> Self {
        self.link = Some(href.into());
        self
    }
}

/// One visual line of a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Line {
    /// Inline runs in reading order
    pub runs: Vec<InlineRun>,
    /// Explicit indent level (code lines)
    pub indent: u32,
    /// Virtual-list placeholder that carries no real content
    pub placeholder: bool,
}

impl Line {
    /// Line made of a single unstyled run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::from_runs(vec![InlineRun::plain(text)])
    }

    /// Line made of the given runs.
    pub fn from_runs(runs: Vec<InlineRun>) -> Self {
        Self {
            runs,
            ..Default::default()
        }
    }

    /// Set the explicit indent level.
    pub fn indented(mut self, indent: u32) -> Self {
        self.indent = indent;
        self
    }

    /// Concatenated text of all runs, styling ignored.
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

/// Kind-specific attributes of a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockAttrs {
    /// Code language label
    pub language: Option<String>,
    /// Code caption
    pub caption: Option<String>,
    /// Bookmark target
    pub url: Option<String>,
    /// Bookmark title
    pub title: Option<String>,
    /// Todo checkbox state
    pub checked: Option<bool>,
    /// Visible list counter, e.g. `"3."`
    pub counter: Option<String>,
    /// Callout emoji
    pub emoji: Option<String>,
    /// Image alternative text
    pub alt: Option<String>,
}

/// A materialized block as measured at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedBlock {
    /// Ephemeral node handle, only meaningful within one query
    pub handle: u64,
    /// Handle of the enclosing block, if nested
    #[serde(default)]
    pub parent: Option<u64>,
    /// Top edge relative to the viewport
    pub top: f64,
    /// Structural markers
    #[serde(default)]
    pub markers: Vec<BlockMarker>,
    /// Visual lines
    #[serde(default)]
    pub lines: Vec<Line>,
    /// Kind-specific attributes
    #[serde(default)]
    pub attrs: BlockAttrs,
}

impl RenderedBlock {
    /// Create a block with no markers and no content.
    pub fn new(handle: u64, top: f64) -> Self {
        Self {
            handle,
            parent: None,
            top,
            markers: Vec::new(),
            lines: Vec::new(),
            attrs: BlockAttrs::default(),
        }
    }

    /// Add a structural marker.
    pub fn with_marker(mut self, marker: BlockMarker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Append a visual line.
    pub fn with_line(mut self, line: Line) -> Self {
        self.lines.push(line);
        self
    }

    /// Append an unstyled line.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_line(Line::plain(text))
    }

    /// Replace the attributes.
    pub fn with_attrs(mut self, attrs: BlockAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Nest the block inside `parent`.
    pub fn nested_in(mut self, parent: u64) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Whether the block carries `marker`.
    pub fn has_marker(&self, marker: &BlockMarker) -> bool {
        self.markers.contains(marker)
    }

    /// Visible text of the block, lines joined by a space.
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(Line::text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
