//! Integration tests for block classification and conversion.

use vdom_capture::converters::{classify, BlockConverter, BlockKind, TrailingSpacing};
use vdom_capture::tree::{BlockAttrs, BlockMarker, InlineRun, Line, RenderedBlock};

// Helper functions for building rendered blocks

fn block(handle: u64, markers: &[BlockMarker]) -> RenderedBlock {
    let mut block = RenderedBlock::new(handle, 0.0);
    block.markers = markers.to_vec();
    block
}

fn convert(block: &RenderedBlock) -> (BlockKind, String, TrailingSpacing) {
    convert_with(block, &[])
}

fn convert_with(
    block: &RenderedBlock,
    descendants: &[RenderedBlock],
) -> (BlockKind, String, TrailingSpacing) {
    let kind = classify(block).expect("block is recognized");
    let fragment = BlockConverter::new()
        .convert(kind, block, descendants)
        .expect("conversion succeeds");
    (kind, fragment.text, fragment.spacing)
}

// Headings and paragraphs

#[test]
fn test_heading_with_inline_styles() {
    let heading = block(1, &[BlockMarker::Text, BlockMarker::Heading(3)]).with_line(
        Line::from_runs(vec![InlineRun::plain("Install "), InlineRun::plain("cargo").code()]),
    );

    let (kind, text, spacing) = convert(&heading);
    assert_eq!(kind, BlockKind::Heading(3));
    assert_eq!(text, "### Install `cargo`");
    assert_eq!(spacing, TrailingSpacing::BlankLine);
}

#[test]
fn test_paragraph_split_link_emitted_once() {
    let paragraph = block(1, &[BlockMarker::Text]).with_line(Line::from_runs(vec![
        InlineRun::plain("Read "),
        InlineRun::plain("the ").italic().linked("https://docs.example/guide"),
        InlineRun::plain("guide").bold().linked("https://docs.example/guide"),
        InlineRun::plain("."),
    ]));

    let (_, text, _) = convert(&paragraph);
    assert_eq!(text, "Read [the guide](https://docs.example/guide).");
    assert_eq!(text.matches("](").count(), 1);
}

#[test]
fn test_paragraph_multiline() {
    let paragraph = block(1, &[BlockMarker::Text])
        .with_text("Line one")
        .with_text("Line two");
    let (kind, text, _) = convert(&paragraph);
    assert_eq!(kind, BlockKind::Paragraph);
    assert_eq!(text, "Line one\nLine two");
}

#[test]
fn test_whitespace_only_paragraph_is_empty() {
    let paragraph = block(1, &[BlockMarker::Text]).with_text("\u{200B}");
    let (kind, text, spacing) = convert(&paragraph);
    assert_eq!(kind, BlockKind::EmptyParagraph);
    assert_eq!(text, "\n");
    assert_eq!(spacing, TrailingSpacing::None);
}

// Lists

#[test]
fn test_ordered_item_uses_visible_counter() {
    let item = block(1, &[BlockMarker::OrderedList])
        .with_text("Twelfth")
        .with_attrs(BlockAttrs {
            counter: Some("12.".to_string()),
            ..Default::default()
        });
    let (_, text, spacing) = convert(&item);
    assert_eq!(text, "12. Twelfth");
    assert_eq!(spacing, TrailingSpacing::None);
}

#[test]
fn test_ordered_item_without_counter_defaults_to_one() {
    let item = block(1, &[BlockMarker::OrderedList]).with_text("First");
    assert_eq!(convert(&item).1, "1. First");
}

#[test]
fn test_todo_wins_over_bullet() {
    let todo = block(1, &[BlockMarker::BulletList, BlockMarker::TodoList])
        .with_text("Write tests")
        .with_attrs(BlockAttrs {
            checked: Some(false),
            ..Default::default()
        });
    let (kind, text, _) = convert(&todo);
    assert_eq!(kind, BlockKind::TodoItem { checked: false });
    assert_eq!(text, "- [ ] Write tests");
}

// Containers

#[test]
fn test_callout_with_nested_list() {
    let callout = block(10, &[BlockMarker::Callout]).with_attrs(BlockAttrs {
        emoji: Some("📌".to_string()),
        ..Default::default()
    });
    let children = vec![
        block(11, &[BlockMarker::Text]).with_text("Remember:").nested_in(10),
        block(12, &[BlockMarker::BulletList]).with_text("backups").nested_in(10),
        block(13, &[BlockMarker::Text]).nested_in(10),
        block(14, &[BlockMarker::BulletList]).with_text("restores").nested_in(10),
    ];

    let (kind, text, spacing) = convert_with(&callout, &children);
    assert_eq!(kind, BlockKind::Callout);
    assert_eq!(text, "> 📌 Remember:\n> - backups\n> - restores");
    assert_eq!(spacing, TrailingSpacing::BlankLine);
}

#[test]
fn test_callout_default_emoji() {
    let callout = block(1, &[BlockMarker::Callout]).with_text("Tip");
    assert_eq!(convert(&callout).1, "> 💡 Tip");
}

#[test]
fn test_quote_with_multiline_paragraph_child() {
    let quote = block(1, &[BlockMarker::Quote]);
    let children = vec![block(2, &[BlockMarker::Text])
        .with_text("one")
        .with_text("")
        .with_text("two")
        .nested_in(1)];
    assert_eq!(convert_with(&quote, &children).1, "> one\n>\n> two");
}

// Leaves

#[test]
fn test_code_block_with_caption() {
    let code = block(1, &[BlockMarker::Code])
        .with_text("fn main() {}")
        .with_attrs(BlockAttrs {
            language: Some("Rust".to_string()),
            caption: Some("Entry point".to_string()),
            ..Default::default()
        });
    let (kind, text, spacing) = convert(&code);
    assert_eq!(kind, BlockKind::Code);
    assert_eq!(text, "*Entry point*\n```rust\nfn main() {}\n```");
    assert_eq!(spacing, TrailingSpacing::LineBreak);
}

#[test]
fn test_code_block_wins_over_text_marker() {
    let code = block(1, &[BlockMarker::Text, BlockMarker::Code]).with_text("ls -la");
    let (kind, text, _) = convert(&code);
    assert_eq!(kind, BlockKind::Code);
    assert_eq!(text, "```\nls -la\n```");
}

#[test]
fn test_divider_bookmark_image() {
    let (_, divider, _) = convert(&block(1, &[BlockMarker::Divider]));
    assert_eq!(divider, "---");

    let bookmark = block(2, &[BlockMarker::Bookmark]).with_attrs(BlockAttrs {
        url: Some("https://crates.io".to_string()),
        title: Some("crates.io".to_string()),
        ..Default::default()
    });
    let (_, text, spacing) = convert(&bookmark);
    assert_eq!(text, "[crates.io](https://crates.io)");
    assert_eq!(spacing, TrailingSpacing::LineBreak);

    let (_, image, spacing) = convert(&block(3, &[BlockMarker::Image]));
    assert_eq!(image, "[image]");
    assert_eq!(spacing, TrailingSpacing::BlankLine);
}

#[test]
fn test_unrecognized_kinds_are_dropped() {
    assert_eq!(classify(&block(1, &[BlockMarker::Other("embed".into())])), None);
}

#[test]
fn test_invalid_heading_level_is_conversion_error() {
    let heading = block(1, &[BlockMarker::Heading(9)]).with_text("deep");
    let kind = classify(&heading).unwrap();
    let err = BlockConverter::new().convert(kind, &heading, &[]).unwrap_err();
    assert!(!err.is_fatal());
    assert!(err.to_string().contains("heading(9)"));
}
