//! Inline run conversion shared by headings, paragraphs, list items and containers.
//!
//! Styling is applied in a fixed order (bold, italic, strikethrough,
//! underline, highlight), each marker wrapping the previous result. Inline
//! code suppresses every other style. Adjacent runs pointing at the same
//! target form one link group and are emitted as a single link.

use crate::converters::whitespace::strip_zero_width;
use crate::tree::{InlineRun, Line};

/// Render a sequence of inline runs to Markdown.
///
/// # Examples
///
/// ```
/// use vdom_capture::converters::inline::render_runs;
/// use vdom_capture::tree::InlineRun;
///
/// let runs = vec![InlineRun::plain("Hello "), InlineRun::plain("world").bold()];
/// assert_eq!(render_runs(&runs), "Hello **world**");
/// ```
pub fn render_runs(runs: &[InlineRun]) -> String {
    let mut out = String::new();
    let mut i = 0;

    while i < runs.len() {
        let run = &runs[i];

        if let Some(href) = run.link.as_deref() {
            // Consume the whole link group so the link is emitted once
            let mut end = i + 1;
            while end < runs.len() && runs[end].link.as_deref() == Some(href) {
                end += 1;
            }
            let label: String = runs[i..end].iter().map(|r| r.text.as_str()).collect();
            out.push_str(&render_link(&strip_zero_width(&label), href));
            i = end;
            continue;
        }

        out.push_str(&render_styled(run));
        i += 1;
    }

    out
}

/// Render every line and join them with `separator`.
pub fn render_lines(lines: &[Line], separator: &str) -> String {
    lines
        .iter()
        .map(|line| render_runs(&line.runs))
        .collect::<Vec<_>>()
        .join(separator)
}

fn render_styled(run: &InlineRun) -> String {
    let text = strip_zero_width(&run.text);

    if run.code {
        return wrap_code(&text);
    }

    let mut rendered = text;
    if run.bold {
        rendered = wrap(&rendered, "**", "**");
    }
    if run.italic {
        rendered = wrap(&rendered, "*", "*");
    }
    if run.strikethrough {
        rendered = wrap(&rendered, "~~", "~~");
    }
    if run.underline {
        rendered = wrap(&rendered, "<u>", "</u>");
    }
    if run.highlight.is_some() {
        rendered = wrap(&rendered, "==", "==");
    }
    rendered
}

fn render_link(label: &str, href: &str) -> String {
    let (lead, core, trail) = split_padding(label);
    let core = if core.is_empty() { href } else { core };
    format!("{lead}[{}]({href}){trail}", escape_label(core))
}

/// Backslash-escape the characters that would end or nest a link label.
fn escape_label(label: &str) -> String {
    let mut escaped = String::with_capacity(label.len());
    for c in label.chars() {
        if matches!(c, '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Wrap the non-whitespace core of `text`, leaving surrounding spaces outside.
fn wrap(text: &str, open: &str, close: &str) -> String {
    let (lead, core, trail) = split_padding(text);
    if core.is_empty() {
        return text.to_string();
    }
    format!("{lead}{open}{core}{close}{trail}")
}

fn wrap_code(text: &str) -> String {
    let (lead, core, trail) = split_padding(text);
    if core.is_empty() {
        return text.to_string();
    }
    let fence = if core.contains('`') { "``" } else { "`" };
    format!("{lead}{fence}{core}{fence}{trail}")
}

fn split_padding(text: &str) -> (&str, &str, &str) {
    let trimmed_start = text.trim_start();
    let lead = &text[..text.len() - trimmed_start.len()];
    let core = trimmed_start.trim_end();
    let trail = &trimmed_start[core.len()..];
    (lead, core, trail)
}
