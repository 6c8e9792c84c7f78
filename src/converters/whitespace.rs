//! Whitespace normalization for converted fragments and the final document.
//!
//! The whole crate follows a single paragraph-separator policy: at most one
//! blank line between blocks, so every run of three or more line breaks
//! collapses to exactly two.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for 3+ consecutive newlines
    static ref RE_MULTI_NEWLINE: Regex = Regex::new(r"\n{3,}").unwrap();

    /// Regex for zero-width characters left behind by rich-text editors
    static ref RE_ZERO_WIDTH: Regex = Regex::new("[\u{200B}\u{200C}\u{200D}\u{FEFF}]").unwrap();
}

/// Collapse every run of 3+ line breaks into exactly 2.
///
/// Idempotent: applying it to its own output changes nothing.
///
/// # Examples
///
/// ```
/// use vdom_capture::converters::whitespace::collapse_blank_lines;
///
/// let input = "Line 1\n\n\n\n\n\nLine 2";
/// assert_eq!(collapse_blank_lines(input), "Line 1\n\nLine 2");
/// ```
pub fn collapse_blank_lines(text: &str) -> String {
    RE_MULTI_NEWLINE.replace_all(text, "\n\n").into_owned()
}

/// Remove zero-width spaces and joiners.
pub fn strip_zero_width(text: &str) -> String {
    if !RE_ZERO_WIDTH.is_match(text) {
        return text.to_string();
    }
    RE_ZERO_WIDTH.replace_all(text, "").into_owned()
}

/// Final normalization of an assembled document.
///
/// Collapses blank-line runs, then trims leading and trailing whitespace.
pub fn normalize_document(text: &str) -> String {
    collapse_blank_lines(text).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_reduces_excessive_breaks() {
        let input = "A\n\n\n\n\nB";
        assert_eq!(collapse_blank_lines(input), "A\n\nB");
    }

    #[test]
    fn test_collapse_preserves_single_and_double_breaks() {
        let input = "A\nB\n\nC";
        assert_eq!(collapse_blank_lines(input), input);
    }

    #[test]
    fn test_collapse_is_idempotent() {
        let once = collapse_blank_lines("x\n\n\n\ny\n\n\nz");
        assert_eq!(collapse_blank_lines(&once), once);
    }

    #[test]
    fn test_strip_zero_width() {
        assert_eq!(strip_zero_width("a\u{200B}b\u{FEFF}"), "ab");
        assert_eq!(strip_zero_width("plain"), "plain");
    }

    #[test]
    fn test_normalize_document_trims() {
        assert_eq!(normalize_document("\n\n# Title\n\n\n\nBody\n\n"), "# Title\n\nBody");
    }
}
