//! User input: idea validation and text direction detection.
//!
//! The idea text is validated here, before it ever reaches the client. The
//! direction heuristic is shared by the input echo and the rendered output.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Maximum idea length, in characters.
pub const MAX_IDEA_CHARS: usize = 500;

/// Idea validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdeaError {
    #[error("Idea is empty")]
    Empty,
    #[error("Idea is too long ({len}/{max} characters)")]
    TooLong { len: usize, max: usize },
}

/// A trimmed, non-empty idea of at most [`MAX_IDEA_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Idea(String);

impl Idea {
    /// Trim and validate raw user input.
    pub fn parse(text: &str) -> Result<Self, IdeaError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(IdeaError::Empty);
        }

        let len = trimmed.chars().count();
        if len > MAX_IDEA_CHARS {
            return Err(IdeaError::TooLong {
                len,
                max: MAX_IDEA_CHARS,
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters, as shown by the `n/500` counter.
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    pub fn direction(&self) -> TextDirection {
        TextDirection::detect(&self.0)
    }
}

impl fmt::Display for Idea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Base text direction for a block of output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

impl TextDirection {
    /// Right-to-left iff the text contains any character of the Arabic block.
    pub fn detect(text: &str) -> Self {
        if text.chars().any(is_arabic) {
            Self::Rtl
        } else {
            Self::Ltr
        }
    }

    pub fn is_rtl(self) -> bool {
        matches!(self, Self::Rtl)
    }
}

fn is_arabic(c: char) -> bool {
    ('\u{0600}'..='\u{06FF}').contains(&c)
}

impl fmt::Display for TextDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ltr => f.write_str("ltr"),
            Self::Rtl => f.write_str("rtl"),
        }
    }
}

impl FromStr for TextDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ltr" => Ok(Self::Ltr),
            "rtl" => Ok(Self::Rtl),
            other => Err(format!("unknown text direction: {other}")),
        }
    }
}
