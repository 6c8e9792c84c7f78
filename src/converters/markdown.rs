//! Markdown conversion for each block kind.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::CaptureConfig;
use crate::converters::code::convert_code;
use crate::converters::inline::{render_lines, render_runs};
use crate::converters::whitespace::{collapse_blank_lines, strip_zero_width};
use crate::converters::{classify, BlockKind, Fragment, TrailingSpacing};
use crate::error::{Error, Result};
use crate::tree::RenderedBlock;

const DEFAULT_CALLOUT_EMOJI: &str = "💡";

lazy_static! {
    /// Leading digits of a visible list counter
    static ref RE_COUNTER: Regex = Regex::new(r"\d+").unwrap();
}

/// Converter from classified blocks to Markdown fragments.
///
/// # Examples
///
/// ```
/// use vdom_capture::converters::{BlockConverter, BlockKind};
/// use vdom_capture::tree::{BlockMarker, RenderedBlock};
///
/// let converter = BlockConverter::new();
/// let block = RenderedBlock::new(7, 0.0).with_marker(BlockMarker::Divider);
/// let fragment = converter.convert(BlockKind::Divider, &block, &[]).unwrap();
/// assert_eq!(fragment.text, "---");
/// ```
#[derive(Debug, Clone)]
pub struct BlockConverter {
    image_placeholder: String,
}

impl Default for BlockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockConverter {
    /// Create a converter with the default image placeholder.
    pub fn new() -> Self {
        Self {
            image_placeholder: "[image]".to_string(),
        }
    }

    /// Create a converter from a capture configuration.
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new().with_image_placeholder(config.placeholder_image_text.clone())
    }

    /// Replace the text emitted for images.
    pub fn with_image_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.image_placeholder = placeholder.into();
        self
    }

    /// Convert one block.
    ///
    /// # Arguments
    ///
    /// * `kind` - Kind the block was classified as
    /// * `block` - The block itself
    /// * `descendants` - Blocks nested (directly or not) inside `block`, in
    ///   tree order; only consulted for containers
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] when the block's attributes are inconsistent
    /// with its kind.
    pub fn convert(
        &self,
        kind: BlockKind,
        block: &RenderedBlock,
        descendants: &[RenderedBlock],
    ) -> Result<Fragment> {
        match kind {
            BlockKind::Heading(level) => Self::heading(level, block),
            BlockKind::Paragraph => Ok(Self::paragraph(block)),
            BlockKind::EmptyParagraph => Ok(Fragment::new("\n", TrailingSpacing::None)),
            BlockKind::Code => Ok(convert_code(block)),
            BlockKind::OrderedItem => Self::ordered_item(block),
            BlockKind::BulletItem => Ok(Self::list_item("- ", block)),
            BlockKind::TodoItem { checked } => {
                let marker = if checked { "- [x] " } else { "- [ ] " };
                Ok(Self::list_item(marker, block))
            },
            BlockKind::Quote => self.container(block, descendants, None),
            BlockKind::Callout => {
                let emoji = block
                    .attrs
                    .emoji
                    .as_deref()
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .unwrap_or(DEFAULT_CALLOUT_EMOJI);
                self.container(block, descendants, Some(emoji))
            },
            BlockKind::Divider => Ok(Fragment::new("---", TrailingSpacing::BlankLine)),
            BlockKind::Bookmark => Ok(Self::bookmark(block)),
            BlockKind::Image => Ok(self.image(block)),
        }
    }

    fn heading(level: u8, block: &RenderedBlock) -> Result<Fragment> {
        if !(1..=6).contains(&level) {
            return Err(Error::Conversion {
                kind: BlockKind::Heading(level),
                reason: format!("heading level {} outside 1..=6", level),
            });
        }
        let text = render_lines(&block.lines, " ");
        Ok(Fragment::new(
            format!("{} {}", "#".repeat(level as usize), text.trim()),
            TrailingSpacing::BlankLine,
        ))
    }

    fn paragraph(block: &RenderedBlock) -> Fragment {
        let text = collapse_blank_lines(&render_lines(&block.lines, "\n"));
        Fragment::new(text.trim(), TrailingSpacing::BlankLine)
    }

    fn ordered_item(block: &RenderedBlock) -> Result<Fragment> {
        let number = match block.attrs.counter.as_deref() {
            None => 1,
            Some(counter) => RE_COUNTER
                .find(counter)
                .and_then(|digits| digits.as_str().parse::<u64>().ok())
                .ok_or_else(|| Error::Conversion {
                    kind: BlockKind::OrderedItem,
                    reason: format!("list counter {:?} carries no number", counter),
                })?,
        };
        Ok(Self::list_item(&format!("{}. ", number), block))
    }

    fn list_item(marker: &str, block: &RenderedBlock) -> Fragment {
        let text = render_lines(&block.lines, " ");
        Fragment::new(format!("{}{}", marker, text.trim()), TrailingSpacing::None)
    }

    fn bookmark(block: &RenderedBlock) -> Fragment {
        let url = block.attrs.url.as_deref().map(str::trim).unwrap_or("");
        if url.is_empty() {
            return Fragment::new("", TrailingSpacing::None);
        }
        let title = block
            .attrs
            .title
            .as_deref()
            .map(|t| strip_zero_width(t).trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| url.to_string());
        Fragment::new(format!("[{}]({})", title, url), TrailingSpacing::LineBreak)
    }

    fn image(&self, block: &RenderedBlock) -> Fragment {
        let text = match block.attrs.alt.as_deref().map(str::trim) {
            Some(alt) if !alt.is_empty() => format!("{} {}", self.image_placeholder, alt),
            _ => self.image_placeholder.clone(),
        };
        Fragment::new(text, TrailingSpacing::BlankLine)
    }

    /// Quote and callout: the block's own lines followed by its direct
    /// children, each output line prefixed with `"> "`.
    fn container(
        &self,
        block: &RenderedBlock,
        descendants: &[RenderedBlock],
        emoji: Option<&str>,
    ) -> Result<Fragment> {
        let mut lines: Vec<String> = block
            .lines
            .iter()
            .map(|line| render_runs(&line.runs))
            .filter(|line| !line.trim().is_empty())
            .collect();

        for child in descendants.iter().filter(|d| d.parent == Some(block.handle)) {
            let Some(kind) = classify(child) else {
                log::trace!("Dropping unrecognized block nested in {}", block.handle);
                continue;
            };
            if kind == BlockKind::EmptyParagraph {
                continue;
            }
            let fragment = self.convert(kind, child, descendants)?;
            lines.extend(fragment.text.lines().map(str::to_string));
        }

        if let Some(emoji) = emoji {
            match lines.first_mut() {
                Some(first) => *first = format!("{} {}", emoji, first),
                None => lines.push(emoji.to_string()),
            }
        }

        let text = if lines.is_empty() {
            "> ".to_string()
        } else {
            lines
                .iter()
                .map(|line| {
                    if line.trim().is_empty() {
                        ">".to_string()
                    } else {
                        format!("> {}", line)
                    }
                })
                .collect::<Vec<_>>()
                .join("\n")
        };

        Ok(Fragment::new(text, TrailingSpacing::BlankLine))
    }
}
