//! Incremental markdown renderer for a restricted dialect.
//!
//! Supported: `#`–`###` headings, `*`/`-`/`+` and `1.` list items with
//! whitespace-derived nesting, paragraphs, blank-line breaks, and `**bold**`,
//! `__bold__`, `*italic*`, `_italic_` spans.
//!
//! The renderer is called again on every growth of a streaming buffer. Output
//! is a pure function of the text it is given: no state survives between
//! calls, truncated markup never fails, and the unterminated last line is
//! classified with the same rules as every other line.

mod block;
mod inline;

pub use block::{Block, BlockKind, MAX_HEADING_LEVEL, parse_line};
pub use inline::{Span, SpanStyle, parse_spans};

use crate::idea::TextDirection;

/// Rendered output for one buffer snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub direction: TextDirection,
    pub blocks: Vec<Block>,
}

/// Classify every `\n`-separated line of `text`, in order.
pub fn parse(text: &str) -> Vec<Block> {
    text.split('\n').map(parse_line).collect()
}

/// Parse `text` and attach the caller-chosen base direction.
pub fn render(text: &str, direction: TextDirection) -> Rendered {
    Rendered {
        direction,
        blocks: parse(text),
    }
}
