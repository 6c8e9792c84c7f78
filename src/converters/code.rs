//! Code block conversion.
//!
//! Code lines are taken verbatim. Hosts that render indentation as separate
//! indent markers report an explicit indent level per line, which is turned
//! back into four spaces per level. When a multi-line body comes out with no
//! indentation at all, a language-aware re-indentation pass is applied.

use lazy_static::lazy_static;
use regex::Regex;

use crate::converters::whitespace::strip_zero_width;
use crate::converters::{Fragment, TrailingSpacing};
use crate::tree::RenderedBlock;

const INDENT: &str = "    ";

lazy_static! {
    /// Lines opening a brace scope
    static ref RE_OPENS_SCOPE: Regex = Regex::new(r"[{\[(]$").unwrap();

    /// Lines closing a brace scope
    static ref RE_CLOSES_SCOPE: Regex = Regex::new(r"^[}\])]").unwrap();

    /// Any tag on the line
    static ref RE_ANY_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
}

/// Normalize a host language label, returning `None` for the plain-text sentinel.
///
/// # Examples
///
/// ```
/// use vdom_capture::converters::code::normalize_language;
///
/// assert_eq!(normalize_language("Python").as_deref(), Some("python"));
/// assert_eq!(normalize_language("C++").as_deref(), Some("cpp"));
/// assert_eq!(normalize_language("Plain Text"), None);
/// ```
pub fn normalize_language(label: &str) -> Option<String> {
    let lowered = label.trim().to_lowercase();
    match lowered.as_str() {
        "" | "plain text" | "plaintext" | "plain_text" => None,
        "c++" => Some("cpp".to_string()),
        "c#" => Some("csharp".to_string()),
        "objective-c" => Some("objectivec".to_string()),
        "shell" => Some("bash".to_string()),
        other => Some(other.replace(' ', "")),
    }
}

/// Convert a code block into a fenced Markdown fragment.
pub fn convert_code(block: &RenderedBlock) -> Fragment {
    let language = block.attrs.language.as_deref().and_then(normalize_language);

    let lines: Vec<String> = block
        .lines
        .iter()
        .filter(|line| !line.placeholder)
        .map(|line| {
            let text = strip_zero_width(&line.text());
            if line.indent > 0 {
                format!("{}{}", INDENT.repeat(line.indent as usize), text.trim_start())
            } else {
                text
            }
        })
        .collect();

    let mut body = lines.join("\n");
    if let Some(lang) = language.as_deref() {
        if lines.len() > 1 && !has_indentation(&lines) {
            body = apply_language_indentation(&body, lang);
        }
    }

    let fence = if body.contains("```") { "````" } else { "```" };
    let mut text = String::new();
    if let Some(caption) = block.attrs.caption.as_deref().map(str::trim) {
        if !caption.is_empty() {
            text.push_str(&format!("*{}*\n", strip_zero_width(caption)));
        }
    }
    text.push_str(fence);
    text.push_str(language.as_deref().unwrap_or(""));
    text.push('\n');
    text.push_str(&body);
    text.push('\n');
    text.push_str(fence);

    Fragment::new(text, TrailingSpacing::LineBreak)
}

fn has_indentation(lines: &[String]) -> bool {
    lines
        .iter()
        .any(|line| line.starts_with(' ') || line.starts_with('\t'))
}

/// Re-indent code whose indentation was lost during rendering.
///
/// Brace languages indent after lines ending in an opening bracket and dedent
/// on lines starting with a closing one. Tag languages indent after an opening
/// tag that stays open. Every other language is returned unchanged.
pub fn apply_language_indentation(code: &str, language: &str) -> String {
    match language {
        "javascript" | "typescript" | "java" | "c" | "cpp" | "csharp" | "php" | "rust" | "go" => {
            reindent(code, |line| RE_CLOSES_SCOPE.is_match(line), |line| {
                RE_OPENS_SCOPE.is_match(line)
            })
        },
        "html" | "xml" => reindent(code, |line| line.starts_with("</"), |line| {
            RE_ANY_TAG.is_match(line) && !line.ends_with('>') && !line.contains("</")
        }),
        _ => code.to_string(),
    }
}

fn reindent(code: &str, dedents: impl Fn(&str) -> bool, indents: impl Fn(&str) -> bool) -> String {
    let mut level: usize = 0;
    let mut out = Vec::new();

    for line in code.split('\n') {
        let trimmed = line.trim();
        if dedents(trimmed) {
            level = level.saturating_sub(1);
        }
        if trimmed.is_empty() {
            out.push(String::new());
        } else {
            out.push(format!("{}{}", INDENT.repeat(level), trimmed));
        }
        if indents(trimmed) {
            level += 1;
        }
    }

    out.join("\n")
}
