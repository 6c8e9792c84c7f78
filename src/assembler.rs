//! Document assembly.
//!
//! Walks a session's global order and joins the cached fragments:
//!
//! - every fragment starts on a fresh line; headings, paragraphs, quotes,
//!   callouts, dividers and images start after a blank line
//! - each fragment is followed by its own trailing spacing
//! - an empty paragraph turns the current line end into a blank line, and is
//!   dropped when the output already ends blank (so runs of them collapse)
//! - fragments with no text (a bookmark without a URL) are omitted
//! - finally runs of 3+ line breaks collapse to 2 and the result is trimmed

use crate::capture::CaptureSession;
use crate::converters::whitespace::normalize_document;
use crate::converters::{BlockKind, Fragment};
use crate::error::{Error, Result};

/// Joins converted fragments into the final document text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentAssembler;

impl DocumentAssembler {
    /// Create an assembler.
    pub fn new() -> Self {
        Self
    }

    /// Assemble the document held by `session`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Assembly`] if the session's order references a block
    /// twice or references a block that is not stored. No partial output is
    /// produced in that case.
    pub fn assemble(&self, session: &CaptureSession) -> Result<String> {
        session.check_invariants()?;

        let mut parts = Vec::with_capacity(session.ordered_ids().len());
        for id in session.ordered_ids() {
            let unit = session
                .store()
                .get(id)
                .ok_or_else(|| {
                    Error::Assembly(format!("ordered block {} missing from store", id))
                })?;
            parts.push((unit.kind, &unit.fragment));
        }

        Ok(self.join(parts))
    }

    /// Join `(kind, fragment)` pairs in order, applying the spacing rules.
    ///
    /// # Examples
    ///
    /// ```
    /// use vdom_capture::assembler::DocumentAssembler;
    /// use vdom_capture::converters::{BlockKind, Fragment, TrailingSpacing};
    ///
    /// let heading = Fragment::new("# Title", TrailingSpacing::BlankLine);
    /// let item = Fragment::new("- one", TrailingSpacing::None);
    /// let next = Fragment::new("- two", TrailingSpacing::None);
    ///
    /// let text = DocumentAssembler::new().join(vec![
    ///     (BlockKind::Heading(1), &heading),
    ///     (BlockKind::BulletItem, &item),
    ///     (BlockKind::BulletItem, &next),
    /// ]);
    /// assert_eq!(text, "# Title\n\n- one\n- two");
    /// ```
    pub fn join<'a, I>(&self, parts: I) -> String
    where
        I: IntoIterator<Item = (BlockKind, &'a Fragment)>,
    {
        let mut out = String::new();

        for (kind, fragment) in parts {
            if kind == BlockKind::EmptyParagraph {
                if out.is_empty() || out.ends_with("\n\n") {
                    continue;
                }
                end_with_newlines(&mut out, 2);
                continue;
            }
            if fragment.text.is_empty() {
                continue;
            }

            if !out.is_empty() {
                let required = if kind.needs_blank_before() { 2 } else { 1 };
                end_with_newlines(&mut out, required);
            }
            out.push_str(&fragment.text);
            out.push_str(fragment.spacing.as_str());
        }

        normalize_document(&out)
    }
}

/// Extend `out` so it ends with at least `count` line breaks.
fn end_with_newlines(out: &mut String, count: usize) {
    let present = out.chars().rev().take_while(|c| *c == '\n').count();
    for _ in present..count {
        out.push('\n');
    }
}
