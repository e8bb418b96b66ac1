//! Common test utilities shared across integration tests.
//!
//! Every test runs against a local `mockito` server, so no backend is needed.

use idea_improver::{Endpoint, ImproveClient, ImproveEvent};
use std::time::Duration;
use tokio::sync::mpsc;

/// Connect timeout for the mock server
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates a client posting directly to the mock server's `/improve`.
#[allow(dead_code)]
pub fn direct_client(server: &mockito::Server) -> ImproveClient {
    let endpoint = Endpoint::direct(&server.url()).expect("mock server URL is valid");
    ImproveClient::new(endpoint, DEFAULT_TIMEOUT).expect("client builds")
}

/// Creates a client posting to the mock server's `/api/improve` proxy route.
#[allow(dead_code)]
pub fn proxy_client(server: &mockito::Server) -> ImproveClient {
    let endpoint = Endpoint::proxy(&server.url()).expect("mock server URL is valid");
    ImproveClient::new(endpoint, DEFAULT_TIMEOUT).expect("client builds")
}

/// Drains the channel, returning the streamed characters and the other events.
#[allow(dead_code)]
pub async fn collect_events(rx: &mut mpsc::Receiver<ImproveEvent>) -> (String, Vec<ImproveEvent>) {
    let mut chars = String::new();
    let mut others = Vec::new();
    while let Some(event) = rx.recv().await {
        match event {
            ImproveEvent::Char(c) => chars.push(c),
            other => others.push(other),
        }
    }
    (chars, others)
}
