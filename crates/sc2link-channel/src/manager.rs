//! Connection manager: owns the one physical socket and the retry loop.
//!
//! The manager is the only place that opens, replaces, or closes a socket.
//! It is driven exclusively by the correlator task, so it needs no locking;
//! other parties watch its [`ConnectionState`] through a `watch` channel.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use sc2link_transport::{
    Connection, ConnectionId, Connector, Endpoint, TransportError,
};
use tokio::sync::watch;

use crate::{ChannelConfig, ChannelError, ChannelStats, ConnectionState, RetryBudget};

/// Owns the socket lifecycle for one logical channel.
///
/// ```text
/// connect():  teardown old socket ─→ Connecting ─→ attempt ─┬─ ok ──→ Connected
///                                         ↑                 │
///                                         └── backoff ←─ fail (budget left)
///                                                           │
///                                         Disconnected ←────┘ (budget spent)
/// ```
pub struct ConnectionManager<C: Connector> {
    connector: C,
    config: ChannelConfig,
    endpoint: Endpoint,
    budget: RetryBudget,
    socket: Option<C::Connection>,
    state: watch::Sender<ConnectionState>,
    stats: Arc<ChannelStats>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, config: ChannelConfig, stats: Arc<ChannelStats>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            endpoint: config.endpoint(),
            budget: RetryBudget::new(config.retry_attempts),
            connector,
            config,
            socket: None,
            state,
            stats,
        }
    }

    /// Opens a fresh socket, replacing the current one.
    ///
    /// The old socket is closed and dropped before the first new attempt,
    /// so at most one socket is ever open. Each attempt is bounded by
    /// `connect_timeout` and consumes one unit of the retry budget.
    ///
    /// # Errors
    /// - [`ChannelError::Shutdown`] once shutdown has begun.
    /// - [`ChannelError::ChannelUnavailable`] when the budget runs out.
    pub async fn connect(&mut self) -> Result<ConnectionId, ChannelError> {
        if self.state().is_shutting_down() {
            return Err(ChannelError::Shutdown);
        }

        self.teardown().await;
        self.set_state(ConnectionState::Connecting);

        loop {
            if !self.budget.try_consume() {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    attempts = self.budget.max(),
                    "retry budget exhausted, channel unavailable"
                );
                self.set_state(ConnectionState::Disconnected);
                return Err(ChannelError::ChannelUnavailable {
                    attempts: self.budget.max(),
                });
            }

            let attempt = self.budget.used();
            self.stats.record_attempt();
            tracing::debug!(endpoint = %self.endpoint, attempt, "connecting");

            let result = tokio::time::timeout(
                self.config.connect_timeout,
                self.connector
                    .connect(&self.endpoint, self.config.max_frame_size),
            )
            .await;

            match result {
                Ok(Ok(conn)) => {
                    let id = conn.id();
                    tracing::info!(
                        endpoint = %self.endpoint,
                        conn_id = %id,
                        attempt,
                        "connected"
                    );
                    self.socket = Some(conn);
                    self.budget.reset();
                    self.stats.record_connect();
                    self.set_state(ConnectionState::Connected);
                    return Ok(id);
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        endpoint = %self.endpoint,
                        attempt,
                        error = %e,
                        "connection attempt failed"
                    );
                }
                Err(_) => {
                    let e = TransportError::ConnectTimeout {
                        url: self.endpoint.url(),
                        timeout: self.config.connect_timeout,
                    };
                    tracing::warn!(attempt, error = %e, "connection attempt timed out");
                }
            }

            if !self.budget.is_exhausted() {
                tokio::time::sleep(self.retry_delay()).await;
            }
        }
    }

    /// Writes one frame to the current socket.
    pub async fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        match &self.socket {
            Some(conn) => conn.send(frame).await,
            None => Err(TransportError::ConnectionClosed("not connected".into())),
        }
    }

    /// Reads the next frame from the current socket. `Ok(None)` means the
    /// engine closed it.
    pub async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        match &self.socket {
            Some(conn) => conn.recv().await,
            None => Err(TransportError::ConnectionClosed("not connected".into())),
        }
    }

    /// Closes and drops the current socket, if any.
    pub async fn teardown(&mut self) {
        if let Some(conn) = self.socket.take() {
            let id = conn.id();
            if let Err(e) = conn.close().await {
                tracing::debug!(conn_id = %id, error = %e, "close failed");
            }
            tracing::debug!(conn_id = %id, "socket torn down");
        }
        if !self.state().is_shutting_down() {
            self.set_state(ConnectionState::Disconnected);
        }
    }

    /// Refills the retry budget so a channel that gave up can try again.
    pub fn reset_budget(&mut self) {
        self.budget.reset();
    }

    /// Releases the socket for good. `Closed` is terminal.
    pub async fn shutdown(&mut self) {
        if self.state() == ConnectionState::Closed {
            return;
        }
        self.set_state(ConnectionState::Closing);
        self.teardown().await;
        self.set_state(ConnectionState::Closed);
        tracing::info!(endpoint = %self.endpoint, "channel closed");
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.socket.is_some() && self.state() == ConnectionState::Connected
    }

    pub fn is_exhausted(&self) -> bool {
        self.budget.is_exhausted()
    }

    pub fn budget(&self) -> RetryBudget {
        self.budget
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn set_state(&self, next: ConnectionState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            tracing::debug!(from = %prev, to = %next, "connection state changed");
        }
    }

    fn retry_delay(&self) -> Duration {
        let jitter = self.config.retry_jitter.as_millis() as u64;
        let extra = if jitter == 0 {
            0
        } else {
            rand::rng().random_range(0..=jitter)
        };
        self.config.retry_backoff + Duration::from_millis(extra)
    }
}

impl<C: Connector> Drop for ConnectionManager<C> {
    fn drop(&mut self) {
        self.state.send_replace(ConnectionState::Closed);
    }
}
