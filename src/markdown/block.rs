//! Line classification.
//!
//! Every line maps to exactly one block kind, checked in this order: blank,
//! heading, unordered item, ordered item, paragraph. Classification looks at
//! the line alone, so a line's block never changes once its newline arrived.

use super::inline::{Span, parse_spans};

/// Deepest heading level; longer `#` runs are clamped.
pub const MAX_HEADING_LEVEL: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// `#`, `##` or `###` at column 0.
    Heading { level: u8 },
    /// `*`, `-` or `+` followed by whitespace.
    UnorderedItem { depth: usize },
    /// Digits, `.`, whitespace. `number` is kept verbatim for display.
    OrderedItem { depth: usize, number: String },
    Paragraph,
    /// Whitespace-only line.
    Break,
}

/// One render-ready line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub spans: Vec<Span>,
}

impl Block {
    pub fn new(kind: BlockKind, spans: Vec<Span>) -> Self {
        Self { kind, spans }
    }

    pub fn is_break(&self) -> bool {
        matches!(self.kind, BlockKind::Break)
    }

    /// Span text with styling dropped.
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Classify a single line (without its line break).
pub fn parse_line(line: &str) -> Block {
    let line = line.strip_suffix('\r').unwrap_or(line);

    if line.trim().is_empty() {
        return Block::new(BlockKind::Break, Vec::new());
    }

    if let Some((level, text)) = heading(line) {
        return Block::new(BlockKind::Heading { level }, parse_spans(text));
    }

    let (indent, rest) = split_indent(line);
    let depth = indent / 2;

    if let Some(text) = unordered_marker(rest) {
        return Block::new(BlockKind::UnorderedItem { depth }, parse_spans(text));
    }

    if let Some((number, text)) = ordered_marker(rest) {
        return Block::new(
            BlockKind::OrderedItem {
                depth,
                number: number.to_string(),
            },
            parse_spans(text),
        );
    }

    Block::new(BlockKind::Paragraph, parse_spans(line))
}

/// `#` run at column 0. Strips the marker and one following space.
fn heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if hashes == 0 {
        return None;
    }
    let level = hashes.min(MAX_HEADING_LEVEL);
    let text = &line[level..];
    Some((level as u8, text.strip_prefix(' ').unwrap_or(text)))
}

/// Leading whitespace width in characters, and the rest of the line.
fn split_indent(line: &str) -> (usize, &str) {
    let rest = line.trim_start();
    let indent = line[..line.len() - rest.len()].chars().count();
    (indent, rest)
}

/// Text after `*`/`-`/`+` and at least one whitespace character.
fn unordered_marker(rest: &str) -> Option<&str> {
    let after = rest
        .strip_prefix('*')
        .or_else(|| rest.strip_prefix('-'))
        .or_else(|| rest.strip_prefix('+'))?;
    after_whitespace(after)
}

/// Number and text after `<digits>.` and at least one whitespace character.
fn ordered_marker(rest: &str) -> Option<(&str, &str)> {
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let after = rest[digits..].strip_prefix('.')?;
    Some((&rest[..digits], after_whitespace(after)?))
}

fn after_whitespace(text: &str) -> Option<&str> {
    let trimmed = text.trim_start();
    (trimmed.len() < text.len()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(line: &str) -> BlockKind {
        parse_line(line).kind
    }

    #[test]
    fn test_blank_lines() {
        assert_eq!(kind(""), BlockKind::Break);
        assert_eq!(kind("   \t"), BlockKind::Break);
        assert_eq!(kind("\r"), BlockKind::Break);
        assert!(parse_line("  ").spans.is_empty());
    }

    #[test]
    fn test_heading_levels() {
        let h1 = parse_line("# Title");
        assert_eq!(h1.kind, BlockKind::Heading { level: 1 });
        assert_eq!(h1.plain_text(), "Title");

        assert_eq!(kind("## Sub"), BlockKind::Heading { level: 2 });
        assert_eq!(kind("### Section"), BlockKind::Heading { level: 3 });
    }

    #[test]
    fn test_heading_strips_one_space() {
        assert_eq!(parse_line("#Title").plain_text(), "Title");
        assert_eq!(parse_line("##  Two").plain_text(), " Two");
        assert_eq!(parse_line("#").plain_text(), "");
    }

    #[test]
    fn test_deep_heading_clamps_to_level_three() {
        let block = parse_line("#### Deep");
        assert_eq!(block.kind, BlockKind::Heading { level: 3 });
        assert_eq!(block.plain_text(), "# Deep");
    }

    #[test]
    fn test_indented_hash_is_paragraph() {
        assert_eq!(kind("  # not a heading"), BlockKind::Paragraph);
    }

    #[test]
    fn test_unordered_items_and_depth() {
        for marker in ["*", "-", "+"] {
            let block = parse_line(&format!("{marker} item"));
            assert_eq!(block.kind, BlockKind::UnorderedItem { depth: 0 });
            assert_eq!(block.plain_text(), "item");
        }
        assert_eq!(kind("  - nested"), BlockKind::UnorderedItem { depth: 1 });
        assert_eq!(kind("   - odd"), BlockKind::UnorderedItem { depth: 1 });
        assert_eq!(kind("    -   deeper"), BlockKind::UnorderedItem { depth: 2 });
        assert_eq!(parse_line("-    spaced").plain_text(), "spaced");
    }

    #[test]
    fn test_marker_without_whitespace_is_paragraph() {
        assert_eq!(kind("-item"), BlockKind::Paragraph);
        assert_eq!(kind("-"), BlockKind::Paragraph);
        assert_eq!(kind("**bold** lead"), BlockKind::Paragraph);
    }

    #[test]
    fn test_marker_with_trailing_space_is_empty_item() {
        let block = parse_line("- ");
        assert_eq!(block.kind, BlockKind::UnorderedItem { depth: 0 });
        assert!(block.spans.is_empty());
    }

    #[test]
    fn test_ordered_items() {
        let block = parse_line("12. twelfth");
        assert_eq!(
            block.kind,
            BlockKind::OrderedItem {
                depth: 0,
                number: "12".to_string()
            }
        );
        assert_eq!(block.plain_text(), "twelfth");

        assert_eq!(
            kind("  3.\tthird"),
            BlockKind::OrderedItem {
                depth: 1,
                number: "3".to_string()
            }
        );
    }

    #[test]
    fn test_ordered_marker_needs_dot_and_space() {
        assert_eq!(kind("1) nope"), BlockKind::Paragraph);
        assert_eq!(kind("1.nope"), BlockKind::Paragraph);
        assert_eq!(kind("1."), BlockKind::Paragraph);
        assert_eq!(kind(". nope"), BlockKind::Paragraph);
    }

    #[test]
    fn test_item_text_gets_spans() {
        let block = parse_line("- **Purpose**: a *clear* goal");
        assert_eq!(
            block.spans,
            vec![
                Span::bold("Purpose"),
                Span::plain(": a "),
                Span::italic("clear"),
                Span::plain(" goal"),
            ]
        );
    }

    #[test]
    fn test_carriage_return_is_dropped() {
        assert_eq!(parse_line("text\r").plain_text(), "text");
    }
}
