//! Pure formatting functions for terminal output.
//!
//! # Categories
//!
//! ## Document Formatters
//! - `format_block()` - One rendered markdown block → one styled line
//! - `format_document()` - A whole rendered snapshot
//! - `block_display_width()`, `wrapped_rows()` - Layout of a formatted block
//!
//! ## CLI Formatters
//! - `format_startup_banner()`, `format_error_message()`, `format_cancelled()`,
//!   `format_char_counter()`, `format_builtin_help()`

use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use crate::idea::{MAX_IDEA_CHARS, TextDirection};
use crate::markdown::{Block, BlockKind, Rendered, Span, SpanStyle};

/// Column width used when the terminal size is unknown.
pub const DEFAULT_WIDTH: usize = 80;

const BULLET: &str = "• ";
const INDENT: &str = "  ";

// ============================================================================
// Document Formatters
// ============================================================================

/// Pure: Format one block as a single terminal line (no trailing newline).
///
/// Right-to-left blocks are right-aligned within `width` columns.
pub fn format_block(block: &Block, direction: TextDirection, width: usize) -> String {
    if block.is_break() {
        return String::new();
    }
    let (prefix, heading) = block_prefix(&block.kind);
    let mut line = String::new();
    if direction.is_rtl() {
        let pad = width.saturating_sub(content_width(block, &prefix));
        line.push_str(&" ".repeat(pad));
    }
    line.push_str(&prefix);
    for span in &block.spans {
        line.push_str(&style_span(span, heading));
    }
    line
}

/// Pure: Columns `format_block` output occupies, ignoring styling.
pub fn block_display_width(block: &Block, direction: TextDirection, width: usize) -> usize {
    let (prefix, _) = block_prefix(&block.kind);
    let content = content_width(block, &prefix);
    if direction.is_rtl() && !block.is_break() {
        content.max(width)
    } else {
        content
    }
}

/// Terminal rows a line of `columns` columns takes when wrapped at `width`.
pub fn wrapped_rows(columns: usize, width: usize) -> usize {
    columns.div_ceil(width.max(1)).max(1)
}

fn block_prefix(kind: &BlockKind) -> (String, Option<u8>) {
    match kind {
        BlockKind::Heading { level } => (String::new(), Some(*level)),
        BlockKind::UnorderedItem { depth } => (format!("{}{BULLET}", INDENT.repeat(*depth)), None),
        BlockKind::OrderedItem { depth, number } => {
            (format!("{}{number}. ", INDENT.repeat(*depth)), None)
        }
        BlockKind::Paragraph | BlockKind::Break => (String::new(), None),
    }
}

fn content_width(block: &Block, prefix: &str) -> usize {
    prefix.width() + block.plain_text().width()
}

fn style_span(span: &Span, heading: Option<u8>) -> String {
    let text = span.text.as_str();
    if text.is_empty() {
        return String::new();
    }
    match (heading, span.style) {
        (Some(1), SpanStyle::Italic) => text.bold().underline().italic().to_string(),
        (Some(1), _) => text.bold().underline().to_string(),
        (Some(_), SpanStyle::Italic) => text.bold().italic().to_string(),
        (Some(_), _) => text.bold().to_string(),
        (None, SpanStyle::Bold) => text.bold().to_string(),
        (None, SpanStyle::Italic) => text.italic().to_string(),
        (None, SpanStyle::Plain) => text.to_string(),
    }
}

/// Pure: Format a rendered snapshot, one line per block.
pub fn format_document(rendered: &Rendered, width: usize) -> String {
    rendered
        .blocks
        .iter()
        .map(|b| format_block(b, rendered.direction, width))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// CLI Formatters
// ============================================================================

/// Format the CLI startup banner.
pub fn format_startup_banner(version: &str, endpoint: &str, mode: &str) -> String {
    format!(
        "{} v{} | {} | {}",
        "idea-improver".bold(),
        version.cyan(),
        endpoint.green(),
        mode.yellow()
    )
}

/// Format an error for the error region (stderr).
pub fn format_error_message(message: &str) -> String {
    format!("[error: {message}]").red().to_string()
}

/// Format the notice shown when a stream is cancelled.
pub fn format_cancelled() -> String {
    "[cancelled]".yellow().to_string()
}

/// Format the `n/500` input counter with the detected input direction.
pub fn format_char_counter(count: usize, direction: TextDirection) -> String {
    format!("{count}/{MAX_IDEA_CHARS} {direction}")
        .dimmed()
        .to_string()
}

/// Format /help output (dimmed, extra trailing newline).
pub fn format_builtin_help(help_text: &str) -> String {
    format!("\n{}\n\n", help_text.dimmed())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{parse_line, render};
    use serial_test::serial;

    // =========================================
    // Document formatter tests
    // =========================================

    #[test]
    #[serial]
    fn test_format_list_items() {
        colored::control::set_override(false);

        let ltr = TextDirection::Ltr;
        assert_eq!(format_block(&parse_line("- one"), ltr, 80), "• one");
        assert_eq!(format_block(&parse_line("    + two"), ltr, 80), "    • two");
        assert_eq!(format_block(&parse_line("  7. seven"), ltr, 80), "  7. seven");

        colored::control::unset_override();
    }

    #[test]
    #[serial]
    fn test_format_heading_and_spans_without_color() {
        colored::control::set_override(false);

        let ltr = TextDirection::Ltr;
        assert_eq!(format_block(&parse_line("## Goals"), ltr, 80), "Goals");
        assert_eq!(
            format_block(&parse_line("**bold** and *italic*"), ltr, 80),
            "bold and italic"
        );
        assert_eq!(format_block(&parse_line("   "), ltr, 80), "");

        colored::control::unset_override();
    }

    #[test]
    #[serial]
    fn test_format_skips_empty_spans() {
        colored::control::set_override(false);

        // "**bo" carries an empty italic span while the closer is in flight
        let line = format_block(&parse_line("**bo"), TextDirection::Ltr, 80);
        assert_eq!(line, "bo");

        colored::control::unset_override();
    }

    #[test]
    #[serial]
    fn test_format_rtl_right_aligns() {
        colored::control::set_override(false);

        let line = format_block(&parse_line("- مرحبا"), TextDirection::Rtl, 20);
        assert_eq!(line.chars().count(), 20);
        assert!(line.ends_with("• مرحبا"));

        // Wider than the terminal: no padding, no truncation
        let long = "x".repeat(30);
        assert_eq!(format_block(&parse_line(&long), TextDirection::Rtl, 20), long);

        colored::control::unset_override();
    }

    #[test]
    #[serial]
    fn test_format_document_joins_lines() {
        colored::control::set_override(false);

        let rendered = render("# A\n\n- b", TextDirection::Ltr);
        assert_eq!(format_document(&rendered, 80), "A\n\n• b");

        colored::control::unset_override();
    }

    #[test]
    fn test_block_display_width() {
        let ltr = TextDirection::Ltr;
        assert_eq!(block_display_width(&parse_line("- **ab**"), ltr, 80), 4);
        assert_eq!(block_display_width(&parse_line(""), ltr, 80), 0);
        assert_eq!(
            block_display_width(&parse_line("سل"), TextDirection::Rtl, 10),
            10
        );
        assert_eq!(
            block_display_width(&parse_line(&"x".repeat(30)), TextDirection::Rtl, 10),
            30
        );
    }

    #[test]
    fn test_wrapped_rows() {
        assert_eq!(wrapped_rows(0, 20), 1);
        assert_eq!(wrapped_rows(20, 20), 1);
        assert_eq!(wrapped_rows(21, 20), 2);
        assert_eq!(wrapped_rows(61, 20), 4);
        assert_eq!(wrapped_rows(5, 0), 5);
    }

    // =========================================
    // CLI formatter tests
    // =========================================

    #[test]
    #[serial]
    fn test_format_startup_banner() {
        colored::control::set_override(false);

        let banner = format_startup_banner("0.1.0", "http://localhost:8000/improve", "auto");
        assert_eq!(
            banner,
            "idea-improver v0.1.0 | http://localhost:8000/improve | auto"
        );

        colored::control::unset_override();
    }

    #[test]
    #[serial]
    fn test_format_error_message() {
        colored::control::set_override(false);

        assert_eq!(
            format_error_message("HTTP error! status: 500"),
            "[error: HTTP error! status: 500]"
        );

        colored::control::unset_override();
    }

    #[test]
    #[serial]
    fn test_format_char_counter() {
        colored::control::set_override(false);

        assert_eq!(format_char_counter(42, TextDirection::Rtl), "42/500 rtl");

        colored::control::unset_override();
    }

    #[test]
    #[serial]
    fn test_format_builtin_help() {
        colored::control::set_override(false);

        let output = format_builtin_help("Commands:\n  /help  Show help");
        assert_eq!(output, "\nCommands:\n  /help  Show help\n\n");

        colored::control::unset_override();
    }
}
