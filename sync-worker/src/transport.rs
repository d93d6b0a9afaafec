//! Notification stream transport
//!
//! The worker talks to the stream through [`StreamTransport`] and
//! [`StreamConnection`] so tests can substitute scripted connections.
//! [`WebSocketTransport`] is the production implementation.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::endpoint::redacted;
use crate::error::TransportError;

/// Upper bound on sending the close handshake during teardown
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Result of one bounded wait on an open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A text frame arrived
    Frame(String),
    /// Nothing usable arrived before the timeout
    Idle,
    /// The peer closed the connection
    Closed,
}

/// An open notification stream, exclusively owned by one worker task.
#[async_trait]
pub trait StreamConnection: Send {
    /// Wait at most `timeout` for the next event.
    async fn next_event(&mut self, timeout: Duration) -> Result<StreamEvent, TransportError>;

    /// Close the connection. Called exactly once, on every exit path.
    async fn close(&mut self);
}

/// Factory for notification stream connections.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn connect(&self, url: &Url) -> Result<Box<dyn StreamConnection>, TransportError>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport backed by `tokio-tungstenite`.
///
/// `wss://` endpoints need the crate's `tls` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StreamTransport for WebSocketTransport {
    async fn connect(&self, url: &Url) -> Result<Box<dyn StreamConnection>, TransportError> {
        if url.scheme() == "wss" && !cfg!(feature = "tls") {
            return Err(TransportError::Connect {
                url: redacted(url),
                reason: "wss:// needs media-sync-worker's `tls` feature".to_string(),
            });
        }

        let (stream, _response) =
            connect_async(url.as_str())
                .await
                .map_err(|e| TransportError::Connect {
                    url: redacted(url),
                    reason: e.to_string(),
                })?;

        Ok(Box::new(WebSocketConnection { stream }))
    }
}

struct WebSocketConnection {
    stream: WsStream,
}

#[async_trait]
impl StreamConnection for WebSocketConnection {
    async fn next_event(&mut self, timeout: Duration) -> Result<StreamEvent, TransportError> {
        let message = match tokio::time::timeout(timeout, self.stream.next()).await {
            Err(_) => return Ok(StreamEvent::Idle),
            Ok(None) => return Ok(StreamEvent::Closed),
            Ok(Some(Err(e))) => return Err(TransportError::Protocol(e.to_string())),
            Ok(Some(Ok(message))) => message,
        };

        Ok(match message {
            Message::Text(text) => StreamEvent::Frame(text.as_str().to_owned()),
            Message::Close(_) => StreamEvent::Closed,
            // Pings are answered by tungstenite on the next read
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {
                StreamEvent::Idle
            }
        })
    }

    async fn close(&mut self) {
        match tokio::time::timeout(CLOSE_TIMEOUT, self.stream.close(None)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("WebSocket close failed: {}", e),
            Err(_) => tracing::debug!("WebSocket close timed out"),
        }
    }
}
