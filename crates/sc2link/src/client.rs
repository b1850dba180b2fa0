//! `S2Client` builder and call surface.
//!
//! This is the entry point for talking to an engine. It ties together all
//! the layers: transport → channel → protocol.

use std::time::Duration;

use sc2link_channel::{ChannelConfig, ChannelStats, ConnectionState, Correlator};
use sc2link_protocol::{
    Codec, ProtobufCodec, ProtocolError, Request, Response, ResponseGameInfo,
    ResponseKind, ResponsePing, ResponseStep, ResponseType, WireCodec,
};
use sc2link_transport::Connector;
#[cfg(feature = "websocket")]
use sc2link_transport::WebSocketConnector;
use tokio::sync::watch;

use crate::S2Error;

/// Builder for configuring and starting an [`S2Client`].
///
/// # Example
///
/// ```rust,no_run
/// use sc2link::prelude::*;
///
/// # async fn run() -> Result<(), S2Error> {
/// let client = S2Client::builder()
///     .host("127.0.0.1")
///     .port(8167)
///     .retry_attempts(5)
///     .build();
///
/// let ping = client.ping().await?;
/// println!("engine {}", ping.game_version);
/// client.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct S2ClientBuilder<K = ProtobufCodec> {
    config: ChannelConfig,
    codec: WireCodec<K>,
}

impl S2ClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K: Codec> S2ClientBuilder<K> {
    /// Swaps the frame encoding. A real engine only understands the default
    /// protobuf codec; the others are for fake engines and debugging.
    pub fn codec<K2: Codec>(self, codec: K2) -> S2ClientBuilder<K2> {
        S2ClientBuilder {
            config: self.config,
            codec: WireCodec::new(codec),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ChannelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the request path. Default: `/sc2api`.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Connection attempts per (re)connect cycle.
    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.config.retry_attempts = attempts;
        self
    }

    pub fn max_frame_size(mut self, bytes: usize) -> Self {
        self.config.max_frame_size = bytes;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Sets the pause between failed attempts and the random jitter added
    /// on top of it.
    pub fn retry_backoff(mut self, backoff: Duration, jitter: Duration) -> Self {
        self.config.retry_backoff = backoff;
        self.config.retry_jitter = jitter;
        self
    }

    /// Starts a client that talks WebSocket to the configured endpoint.
    ///
    /// The first connection is opened in the background; calls made before
    /// it completes simply wait for it.
    ///
    /// # Panics
    /// If called outside a Tokio runtime.
    #[cfg(feature = "websocket")]
    pub fn build(self) -> S2Client {
        self.build_with(WebSocketConnector)
    }

    /// Starts a client over any [`Connector`], e.g. an in-memory one.
    ///
    /// # Panics
    /// If called outside a Tokio runtime.
    pub fn build_with<C: Connector>(self, connector: C) -> S2Client {
        tracing::debug!(endpoint = %self.config.endpoint(), "starting client");
        S2Client {
            correlator: Correlator::spawn(connector, self.config, self.codec),
        }
    }
}

/// A handle to one logical channel to the engine.
///
/// Cheap to clone. Every clone feeds the same queue, so calls from all of
/// them reach the engine one at a time in the order they were made.
#[derive(Debug, Clone)]
pub struct S2Client {
    correlator: Correlator,
}

impl S2Client {
    /// Creates a new builder.
    pub fn builder() -> S2ClientBuilder {
        S2ClientBuilder::new()
    }

    /// Sends one request and waits for its reply.
    ///
    /// There is no per-call timeout. Wrap the future in
    /// `tokio::time::timeout` if you need one; a call abandoned after it
    /// reached the wire still holds the channel until its reply arrives or
    /// the socket is lost.
    pub async fn call(&self, request: impl Into<Request>) -> Result<Response, S2Error> {
        Ok(self.correlator.submit(request.into()).await?)
    }

    pub async fn ping(&self) -> Result<ResponsePing, S2Error> {
        match self.call(Request::Ping).await?.into_kind() {
            ResponseKind::Ping(ping) => Ok(ping),
            _ => Err(unexpected(ResponseType::Ping)),
        }
    }

    pub async fn game_info(&self) -> Result<ResponseGameInfo, S2Error> {
        match self.call(Request::GameInfo).await?.into_kind() {
            ResponseKind::GameInfo(info) => Ok(info),
            _ => Err(unexpected(ResponseType::GameInfo)),
        }
    }

    /// Advances the simulation by `count` game loops.
    pub async fn step(&self, count: u32) -> Result<ResponseStep, S2Error> {
        match self.call(Request::Step { count }).await?.into_kind() {
            ResponseKind::Step(step) => Ok(step),
            _ => Err(unexpected(ResponseType::Step)),
        }
    }

    pub async fn quick_save(&self) -> Result<Response, S2Error> {
        self.call(Request::QuickSave).await
    }

    pub async fn quick_load(&self) -> Result<Response, S2Error> {
        self.call(Request::QuickLoad).await
    }

    pub async fn leave_game(&self) -> Result<Response, S2Error> {
        self.call(Request::LeaveGame).await
    }

    pub fn state(&self) -> ConnectionState {
        self.correlator.state()
    }

    /// Observes connection state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.correlator.subscribe()
    }

    pub fn stats(&self) -> &ChannelStats {
        self.correlator.stats()
    }

    /// Restores the full retry budget and opens a fresh connection.
    ///
    /// This is how a client recovers after
    /// [`S2Error::is_channel_unavailable`]. It runs after any calls already
    /// queued.
    pub async fn reconnect(&self) -> Result<(), S2Error> {
        Ok(self.correlator.reconnect().await?)
    }

    /// Shuts the channel down.
    ///
    /// A call already on the wire completes or fails first. Calls still
    /// queued fail with a shutdown error, and the socket is closed before
    /// this returns. Every clone of this client is affected.
    pub async fn shutdown(&self) {
        self.correlator.shutdown().await;
    }
}

fn unexpected(expected: ResponseType) -> S2Error {
    S2Error::Protocol(ProtocolError::MalformedResponse(format!(
        "provided argument doesn't have {expected} response"
    )))
}
