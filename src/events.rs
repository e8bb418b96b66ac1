//! Event handling for UI layers.
//!
//! This module is the canonical location for:
//! - `ImproveEvent` - What the client sends while a response streams in
//! - `ResponseBuffer` - Append-only accumulation of the streamed text
//! - `EventHandler` trait - UI implementations handle `ImproveEvent`s
//! - `dispatch_event()` / `drain_events()` - Central event dispatch
//!
//! # Design
//!
//! The client never touches UI state. It pushes events through a channel and
//! the UI drains them, re-rendering from its own buffer:
//!
//! - `TerminalEventHandler`: live view for an interactive terminal
//! - `CollectingHandler`: renders once at the end (piped stdout)

use std::io::{self, Write};

use tokio::sync::mpsc;

use crate::format::{block_display_width, format_block, format_document, wrapped_rows};
use crate::idea::TextDirection;
use crate::markdown::{self, parse_line};

/// Return to column 0 and clear to the end of the screen.
pub const CLEAR_FRAME: &str = "\r\x1b[J";

/// Events emitted by the client while a streamed response is consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImproveEvent {
    /// One character, in source order.
    Char(char),
    /// The stream ended normally.
    Complete,
    /// The stream was cancelled before it ended.
    Cancelled,
    /// The stream broke partway; carries the error message.
    Failed(String),
}

// ============================================================================
// Response Buffer
// ============================================================================

/// Accumulated response text. Grows only; never shrinks or rewrites.
#[derive(Debug, Default, Clone)]
pub struct ResponseBuffer {
    text: String,
    chars: usize,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, c: char) {
        self.text.push(c);
        self.chars += 1;
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len_chars(&self) -> usize {
        self.chars
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The line still being written (after the last `\n`).
    pub fn last_line(&self) -> &str {
        self.text.rsplit('\n').next().unwrap_or("")
    }

    /// Number of lines terminated by `\n`.
    pub fn completed_lines(&self) -> usize {
        self.text.matches('\n').count()
    }
}

// ============================================================================
// EventHandler trait and implementations
// ============================================================================

/// Handler for client events. UI modes implement this to process events.
pub trait EventHandler {
    /// Handle one streamed character.
    fn on_char(&mut self, c: char);

    /// Handle normal end of stream (optional, default no-op).
    fn on_complete(&mut self) {}

    /// Handle cancellation (optional, default no-op).
    fn on_cancelled(&mut self) {}

    /// Handle a stream that broke partway (optional, default no-op).
    fn on_failed(&mut self, _message: &str) {}
}

/// Dispatch an event to the matching handler method.
pub fn dispatch_event<H: EventHandler>(handler: &mut H, event: &ImproveEvent) {
    match event {
        ImproveEvent::Char(c) => handler.on_char(*c),
        ImproveEvent::Complete => handler.on_complete(),
        ImproveEvent::Cancelled => handler.on_cancelled(),
        ImproveEvent::Failed(message) => handler.on_failed(message),
    }
}

/// Dispatch events until every sender is dropped.
pub async fn drain_events<H: EventHandler>(rx: &mut mpsc::Receiver<ImproveEvent>, handler: &mut H) {
    while let Some(event) = rx.recv().await {
        dispatch_event(handler, &event);
    }
}

/// Live terminal view.
///
/// Finished lines are printed once. The line still being written is redrawn
/// in place after every character, so markers and spans settle as they
/// complete. A redraw first moves up over the rows the previous frame wrapped
/// onto, so lines wider than the terminal are replaced rather than repeated.
///
/// Without a forced direction, alignment switches to right-to-left at the
/// first Arabic-script character. Lines already committed are not redrawn,
/// so they keep their left alignment; a response that mixes scripts can show
/// both alignments. `CollectingHandler` picks one direction for the whole
/// text instead.
pub struct TerminalEventHandler<W: Write> {
    out: W,
    buffer: ResponseBuffer,
    width: usize,
    /// Caller-forced direction; detected from the buffer when `None`.
    direction: Option<TextDirection>,
    saw_rtl: bool,
    /// Rows the in-progress frame occupies; 0 after a committed line.
    frame_rows: usize,
}

impl<W: Write> TerminalEventHandler<W> {
    pub fn new(out: W, width: usize, direction: Option<TextDirection>) -> Self {
        Self {
            out,
            buffer: ResponseBuffer::new(),
            width,
            direction,
            saw_rtl: false,
            frame_rows: 0,
        }
    }

    pub fn buffer(&self) -> &ResponseBuffer {
        &self.buffer
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    /// Buffer is append-only, so once right-to-left text shows up it stays.
    fn direction(&self) -> TextDirection {
        self.direction.unwrap_or(if self.saw_rtl {
            TextDirection::Rtl
        } else {
            TextDirection::Ltr
        })
    }

    fn draw_line(&mut self, line: &str, terminate: bool) -> io::Result<()> {
        let block = parse_line(line);
        let direction = self.direction();
        let formatted = format_block(&block, direction, self.width);

        if self.frame_rows > 1 {
            write!(self.out, "\x1b[{}A", self.frame_rows - 1)?;
        }
        write!(self.out, "{CLEAR_FRAME}{formatted}")?;
        if terminate {
            writeln!(self.out)?;
            self.frame_rows = 0;
        } else {
            let columns = block_display_width(&block, direction, self.width);
            self.frame_rows = wrapped_rows(columns, self.width);
        }
        self.out.flush()
    }

    fn commit_last_line(&mut self) {
        if self.buffer.last_line().is_empty() {
            return;
        }
        let line = self.buffer.last_line().to_string();
        if let Err(e) = self.draw_line(&line, true) {
            tracing::warn!("failed to write output: {e}");
        }
    }
}

impl<W: Write> EventHandler for TerminalEventHandler<W> {
    fn on_char(&mut self, c: char) {
        if !self.saw_rtl {
            let mut utf8 = [0u8; 4];
            self.saw_rtl = TextDirection::detect(c.encode_utf8(&mut utf8)).is_rtl();
        }

        let result = if c == '\n' {
            let finished = self.buffer.last_line().to_string();
            self.buffer.push(c);
            self.draw_line(&finished, true)
        } else {
            self.buffer.push(c);
            let line = self.buffer.last_line().to_string();
            self.draw_line(&line, false)
        };

        if let Err(e) = result {
            tracing::warn!("failed to write output: {e}");
        }
    }

    fn on_complete(&mut self) {
        self.commit_last_line();
        tracing::debug!(
            lines = self.buffer.completed_lines(),
            chars = self.buffer.len_chars(),
            "response rendered"
        );
    }

    fn on_cancelled(&mut self) {
        // Partial output stays on screen
        self.commit_last_line();
    }

    fn on_failed(&mut self, _message: &str) {
        self.commit_last_line();
    }
}

/// Non-interactive sink: collects everything, renders once at the end.
///
/// The end is completion, cancellation, or failure; whatever arrived is
/// always written.
pub struct CollectingHandler<W: Write> {
    out: W,
    buffer: ResponseBuffer,
    width: usize,
    /// Caller-forced direction; detected from the whole text when `None`.
    direction: Option<TextDirection>,
}

impl<W: Write> CollectingHandler<W> {
    pub fn new(out: W, width: usize, direction: Option<TextDirection>) -> Self {
        Self {
            out,
            buffer: ResponseBuffer::new(),
            width,
            direction,
        }
    }

    pub fn buffer(&self) -> &ResponseBuffer {
        &self.buffer
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    fn flush_rendered(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let text = self.buffer.as_str();
        let direction = self
            .direction
            .unwrap_or_else(|| TextDirection::detect(text));
        let rendered = markdown::render(text, direction);
        let result = writeln!(self.out, "{}", format_document(&rendered, self.width))
            .and_then(|()| self.out.flush());
        if let Err(e) = result {
            tracing::warn!("failed to write output: {e}");
        }
    }
}

impl<W: Write> EventHandler for CollectingHandler<W> {
    fn on_char(&mut self, c: char) {
        self.buffer.push(c);
    }

    fn on_complete(&mut self) {
        self.flush_rendered();
    }

    fn on_cancelled(&mut self) {
        self.flush_rendered();
    }

    fn on_failed(&mut self, _message: &str) {
        self.flush_rendered();
    }
}
