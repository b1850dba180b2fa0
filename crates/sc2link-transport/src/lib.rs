//! Client-side transport layer for sc2link.
//!
//! Provides the [`Connector`] and [`Connection`] traits that abstract over
//! one message-framed, full-duplex link to the engine, plus two
//! implementations:
//!
//! - [`WebSocketConnector`]: the real thing, via `tokio-tungstenite`
//! - [`MemoryConnector`]: an in-process pair used by tests and fake engines
//!
//! A [`Connection`] maps to exactly one physical socket. It is never reused:
//! reconnecting always goes back through [`Connector::connect`] and yields a
//! fresh [`ConnectionId`].
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

mod error;
mod memory;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use memory::{MemoryConnection, MemoryConnector, MemoryListener};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketConnector};

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs across all transports.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for one physical connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-wide unique id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// The remote engine address: host, port and the fixed request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Endpoint {
    /// Creates an endpoint. A missing leading `/` on `path` is added.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        path: impl Into<String>,
    ) -> Self {
        let mut path = path.into();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        Self {
            host: host.into(),
            port,
            path,
        }
    }

    /// The WebSocket URL for this endpoint.
    pub fn url(&self) -> String {
        format!("ws://{}:{}{}", self.host, self.port, self.path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

/// Opens new outbound connections.
///
/// The returned futures are `Send` so a connector can be driven from a
/// spawned Tokio task.
pub trait Connector: Send + Sync + 'static {
    /// The connection type produced by this connector.
    type Connection: Connection;

    /// Makes one connection attempt to `endpoint`.
    ///
    /// `max_frame_size` bounds every message sent or received over the
    /// resulting connection. Timeouts are applied by the caller.
    fn connect(
        &self,
        endpoint: &Endpoint,
        max_frame_size: usize,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// A single connection that can send and receive whole messages.
pub trait Connection: Send + Sync + 'static {
    /// Sends one message to the remote peer.
    ///
    /// Fails with [`TransportError::FrameTooLarge`] before writing anything
    /// if `data` exceeds the connection's frame limit.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    ///
    /// Must be cancel-safe: dropping the future before it completes loses
    /// no message.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

/// Rejects frames above `max` without touching the wire.
pub(crate) fn check_frame_size(
    size: usize,
    max: usize,
) -> Result<(), TransportError> {
    if size > max {
        tracing::warn!(size, max, "frame exceeds maximum size");
        return Err(TransportError::FrameTooLarge { size, max });
    }
    Ok(())
}
