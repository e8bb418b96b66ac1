//! Streaming request client for the idea-improvement endpoint.
//!
//! One `POST` carries the idea; the response is read either as a single JSON
//! object (`{"improved_content": ...}`) or as an open text stream with no
//! framing. In stream mode every decoded character is sent to the UI as an
//! `ImproveEvent::Char`, each followed by the pause the `TypingPace` policy
//! assigns to its position in the response. The position counter runs across
//! fragment boundaries, so the speed ramp is continuous.
//!
//! The client never touches UI state: events go through a channel, and
//! cancellation comes in through a `CancellationToken`.

use std::fmt;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::config::Endpoint;
use crate::decode::{DecodeError, Utf8StreamDecoder};
use crate::events::ImproveEvent;
use crate::idea::Idea;
use crate::pacing::TypingPace;

/// Request/stream errors. None are retried.
#[derive(Debug, thiserror::Error)]
pub enum ImproveError {
    /// Non-success HTTP status.
    #[error("HTTP error! status: {status}")]
    Transport { status: u16 },
    /// The request could not be sent (connection, DNS, TLS, timeout).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Body missing, unreadable, or missing the expected field.
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl ImproveError {
    /// HTTP status for transport errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status } => Some(*status),
            _ => None,
        }
    }
}

/// How the response body is interpreted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// `Whole` for `application/json` responses, `Stream` otherwise.
    #[default]
    Auto,
    /// Raw text stream, typed out character by character.
    Stream,
    /// Single JSON object with an `improved_content` field.
    Whole,
}

impl ResponseMode {
    /// Resolve `Auto` against the response content type.
    pub fn resolve(self, content_type: Option<&str>) -> Self {
        match self {
            Self::Auto if content_type.is_some_and(is_json) => Self::Whole,
            Self::Auto => Self::Stream,
            other => other,
        }
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Stream => f.write_str("stream"),
            Self::Whole => f.write_str("whole"),
        }
    }
}

fn is_json(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

#[derive(Serialize)]
struct IdeaRequest<'a> {
    idea: &'a str,
}

#[derive(Deserialize)]
struct IdeaResponse {
    improved_content: String,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

/// Outcome of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImproveResult {
    /// Everything received. On cancellation, what arrived before it.
    pub text: String,
    /// Characters delivered as `ImproveEvent::Char`.
    pub chars_emitted: usize,
    pub cancelled: bool,
}

/// HTTP client bound to one endpoint.
#[derive(Debug, Clone)]
pub struct ImproveClient {
    http: reqwest::Client,
    endpoint: Endpoint,
}

impl ImproveClient {
    pub fn new(endpoint: Endpoint, connect_timeout: Duration) -> Result<Self, ImproveError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("idea-improver/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Send the idea and read the response.
    ///
    /// With `events_tx` set and a streamed response, characters are sent one
    /// at a time with typing pauses and `ImproveEvent::Complete` follows the
    /// last one. A stream that breaks partway sends `ImproveEvent::Failed`
    /// before the error is returned. Whole responses send no events. Dropping
    /// the receiver stops the typing but the body is still read to the end.
    #[instrument(skip_all, fields(endpoint = %self.endpoint, mode = %mode))]
    pub async fn improve(
        &self,
        idea: &Idea,
        mode: ResponseMode,
        events_tx: Option<mpsc::Sender<ImproveEvent>>,
        pace: &TypingPace,
        cancellation_token: &CancellationToken,
    ) -> Result<ImproveResult, ImproveError> {
        tracing::debug!(chars = idea.char_count(), "sending idea");

        let request = self
            .http
            .post(self.endpoint.improve_url().clone())
            .json(&IdeaRequest {
                idea: idea.as_str(),
            })
            .send();

        let response = tokio::select! {
            biased;
            () = cancellation_token.cancelled() => {
                return Ok(cancelled_result(String::new(), 0, events_tx).await);
            }
            response = request => response?,
        };

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "request rejected");
            return Err(ImproveError::Transport {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());

        match mode.resolve(content_type) {
            ResponseMode::Whole => {
                let body = response.bytes().await.map_err(|e| {
                    ImproveError::Protocol(format!("Failed to read response body: {e}"))
                })?;
                let text = parse_whole_body(&body)?;
                Ok(ImproveResult {
                    text,
                    chars_emitted: 0,
                    cancelled: false,
                })
            }
            _ => {
                process_text_stream(response.bytes_stream(), events_tx, pace, cancellation_token)
                    .await
            }
        }
    }

    /// `GET` the backend health route, expecting `{"status": "ok"}`.
    pub async fn health(&self) -> Result<(), ImproveError> {
        let response = self
            .http
            .get(self.endpoint.health_url().clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImproveError::Transport {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            ImproveError::Protocol(format!("Failed to read response body: {e}"))
        })?;
        let health: HealthResponse = serde_json::from_slice(&body)
            .map_err(|e| ImproveError::Protocol(format!("Invalid health payload: {e}")))?;

        if health.status == "ok" {
            Ok(())
        } else {
            Err(ImproveError::Protocol(format!(
                "Unexpected health status: {}",
                health.status
            )))
        }
    }
}

/// Extract `improved_content` from a whole-response body.
pub fn parse_whole_body(body: &[u8]) -> Result<String, ImproveError> {
    serde_json::from_slice::<IdeaResponse>(body)
        .map(|r| r.improved_content)
        .map_err(|e| ImproveError::Protocol(format!("Invalid response payload: {e}")))
}

/// Consume a raw text stream.
///
/// Transport agnostic: any stream of byte fragments works. Fragments are
/// decoded in arrival order; with `events_tx` set, their characters are typed
/// out in source order before the next fragment is read.
pub async fn process_text_stream<S, B, E>(
    stream: S,
    events_tx: Option<mpsc::Sender<ImproveEvent>>,
    pace: &TypingPace,
    cancellation_token: &CancellationToken,
) -> Result<ImproveResult, ImproveError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    let mut stream = std::pin::pin!(stream);
    let mut decoder = Utf8StreamDecoder::new();
    let mut typist = Typist::new(events_tx, pace);
    let mut text = String::new();

    loop {
        let next = tokio::select! {
            biased;
            () = cancellation_token.cancelled() => None,
            next = stream.next() => Some(next),
        };

        let Some(next) = next else {
            return Ok(cancelled_result(text, typist.emitted, typist.tx).await);
        };
        let Some(item) = next else {
            break;
        };

        let bytes = match item {
            Ok(bytes) => bytes,
            Err(e) => {
                let err = ImproveError::Protocol(format!("Failed to read response body: {e}"));
                return Err(typist.fail(err).await);
            }
        };
        let fragment = match decoder.decode(bytes.as_ref()) {
            Ok(fragment) => fragment,
            Err(e) => return Err(typist.fail(e.into()).await),
        };
        tracing::trace!(
            bytes = bytes.as_ref().len(),
            chars = fragment.chars().count(),
            pending = decoder.pending_len(),
            "fragment"
        );
        text.push_str(&fragment);

        if typist.type_out(&fragment, cancellation_token).await == Typed::Cancelled {
            return Ok(cancelled_result(text, typist.emitted, typist.tx).await);
        }
    }

    if let Err(e) = decoder.finish() {
        return Err(typist.fail(e.into()).await);
    }

    if let Some(tx) = typist.tx.take() {
        let _ = tx.send(ImproveEvent::Complete).await;
    }

    tracing::debug!(chars = typist.emitted, "stream complete");
    Ok(ImproveResult {
        text,
        chars_emitted: typist.emitted,
        cancelled: false,
    })
}

async fn cancelled_result(
    text: String,
    chars_emitted: usize,
    events_tx: Option<mpsc::Sender<ImproveEvent>>,
) -> ImproveResult {
    tracing::debug!(chars_emitted, "stream cancelled");
    if let Some(tx) = events_tx {
        let _ = tx.send(ImproveEvent::Cancelled).await;
    }
    ImproveResult {
        text,
        chars_emitted,
        cancelled: true,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Typed {
    Done,
    Cancelled,
}

/// Emits characters with typing pauses. Inert without a sender.
struct Typist<'a> {
    tx: Option<mpsc::Sender<ImproveEvent>>,
    pace: &'a TypingPace,
    /// Characters emitted since the response started.
    emitted: usize,
}

impl<'a> Typist<'a> {
    fn new(tx: Option<mpsc::Sender<ImproveEvent>>, pace: &'a TypingPace) -> Self {
        Self { tx, pace, emitted: 0 }
    }

    async fn type_out(&mut self, fragment: &str, cancellation_token: &CancellationToken) -> Typed {
        for c in fragment.chars() {
            if cancellation_token.is_cancelled() {
                return Typed::Cancelled;
            }
            let Some(tx) = &self.tx else {
                return Typed::Done;
            };
            if tx.send(ImproveEvent::Char(c)).await.is_err() {
                tracing::warn!("event receiver dropped, typing stopped");
                self.tx = None;
                return Typed::Done;
            }

            let delay = self.pace.delay(self.emitted);
            self.emitted += 1;
            if self.pace.is_instant() {
                continue;
            }
            tokio::select! {
                biased;
                () = cancellation_token.cancelled() => return Typed::Cancelled,
                () = tokio::time::sleep(delay) => {}
            }
        }
        Typed::Done
    }

    /// Tell the UI the stream broke so it can keep what it has.
    async fn fail(&mut self, err: ImproveError) -> ImproveError {
        tracing::debug!(chars_emitted = self.emitted, "stream failed: {err}");
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(ImproveEvent::Failed(err.to_string())).await;
        }
        err
    }
}
