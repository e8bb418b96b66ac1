//! Inline span decomposition: bold, then italic, then plain text.
//!
//! Two passes over a line's content. The first pass pairs `**`/`__`
//! delimiters into bold spans; the second pass pairs `*`/`_` delimiters into
//! italic spans inside the text the first pass left over. A closing delimiter
//! must be the same character as the opening one, the shortest pairing wins,
//! and empty content is allowed. Anything unpaired stays plain text.
//!
//! Both passes use the same linear scanner. Once a delimiter has no closer
//! to the right of some position, it has none to the right of any later
//! position either, so it is never searched for again. Runs of unmatched
//! delimiters therefore cost one scan each, not one scan per occurrence.

use std::fmt;

const BOLD_DELIMITERS: [&str; 2] = ["**", "__"];
const ITALIC_DELIMITERS: [&str; 2] = ["*", "_"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanStyle {
    Plain,
    Bold,
    Italic,
}

/// A styled run of text within one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub style: SpanStyle,
    pub text: String,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            style: SpanStyle::Plain,
            text: text.into(),
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            style: SpanStyle::Bold,
            text: text.into(),
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            style: SpanStyle::Italic,
            text: text.into(),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Scanner output: text outside any pair, or the content between a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece<'a> {
    Outside(&'a str),
    Inside(&'a str),
}

/// Decompose a line's content into spans.
pub fn parse_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    for piece in scan_pairs(text, &BOLD_DELIMITERS) {
        match piece {
            Piece::Inside(bold) => spans.push(Span::bold(bold)),
            Piece::Outside(rest) => {
                spans.extend(scan_pairs(rest, &ITALIC_DELIMITERS).into_iter().map(
                    |p| match p {
                        Piece::Inside(italic) => Span::italic(italic),
                        Piece::Outside(plain) => Span::plain(plain),
                    },
                ));
            }
        }
    }
    spans
}

/// Split `text` into paired and unpaired pieces, left to right.
///
/// Delimiters must be ASCII and start with distinct characters, so at most
/// one can open at any position.
fn scan_pairs<'a>(text: &'a str, delimiters: &[&str]) -> Vec<Piece<'a>> {
    let mut pieces = Vec::new();
    let mut exhausted = vec![false; delimiters.len()];
    let mut last = 0;
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        let opener = delimiters
            .iter()
            .enumerate()
            .find(|(i, d)| !exhausted[*i] && rest.starts_with(**d));

        if let Some((i, delim)) = opener {
            let content_start = pos + delim.len();
            match text[content_start..].find(*delim) {
                Some(rel) => {
                    let close = content_start + rel;
                    if pos > last {
                        pieces.push(Piece::Outside(&text[last..pos]));
                    }
                    pieces.push(Piece::Inside(&text[content_start..close]));
                    pos = close + delim.len();
                    last = pos;
                    continue;
                }
                None => exhausted[i] = true,
            }
        }

        pos += rest.chars().next().map_or(1, char::len_utf8);
    }

    if last < text.len() {
        pieces.push(Piece::Outside(&text[last..]));
    }
    pieces
}
