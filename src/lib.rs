//! idea-improver library - exposes core functionality for integration tests.
//!
//! The binary crate (main.rs) uses these same modules.

pub mod client;
pub mod config;
pub mod decode;
pub mod events;
pub mod format;
pub mod idea;
pub mod logging;
pub mod markdown;
pub mod pacing;

// Re-export commonly used types
pub use client::{ImproveClient, ImproveError, ImproveResult, ResponseMode, process_text_stream};
pub use config::{Config, Endpoint, EndpointKind, load_config};
pub use events::{EventHandler, ImproveEvent, ResponseBuffer};
pub use idea::{Idea, IdeaError, TextDirection};
pub use markdown::{Block, BlockKind, Rendered, Span, SpanStyle, parse, render};
pub use pacing::TypingPace;
