//! The correlator: a single task that serializes calls onto the socket and
//! pairs each reply with the call that caused it.
//!
//! Callers talk to it through a cloneable [`Correlator`] handle. Every call
//! is a `Command::Call` carrying a oneshot reply channel; the task handles
//! one call at a time, so the engine never sees more than one request in
//! flight and callers are answered in the order they submitted.
//!
//! ```text
//! caller A ─┐                      ┌──────────── correlator task ─────────────┐
//! caller B ─┼─ mpsc ─→ Call queue ─→ assign id → send → recv → check id → reply
//! caller C ─┘                      └────────────────── one at a time ─────────┘
//! ```
//!
//! Between calls the task also watches the idle socket, so an engine that
//! hangs up while nothing is pending is noticed and the socket is replaced
//! before the next call goes out.

use std::collections::VecDeque;
use std::sync::Arc;

use sc2link_protocol::{Codec, Request, RequestId, Response, ResponseType, WireCodec};
use sc2link_transport::{ConnectionId, Connector, TransportError};
use tokio::sync::{mpsc, oneshot, watch};

use crate::{ChannelConfig, ChannelError, ChannelStats, ConnectionManager, ConnectionState};

/// Queue depth between callers and the correlator task.
const COMMAND_QUEUE: usize = 64;

enum Command {
    Call {
        request: Request,
        reply: oneshot::Sender<Result<Response, ChannelError>>,
    },
    Reconnect {
        reply: oneshot::Sender<Result<(), ChannelError>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to a running correlator task.
///
/// Cheap to clone. The task stops once [`Correlator::shutdown`] is called
/// or every handle has been dropped.
#[derive(Clone)]
pub struct Correlator {
    sender: mpsc::Sender<Command>,
    state: watch::Receiver<ConnectionState>,
    stats: Arc<ChannelStats>,
}

impl std::fmt::Debug for Correlator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Correlator")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Correlator {
    /// Spawns the correlator task on the current Tokio runtime.
    ///
    /// The task opens the first connection straight away; calls submitted
    /// meanwhile wait in the queue.
    pub fn spawn<C, K>(connector: C, config: ChannelConfig, codec: WireCodec<K>) -> Self
    where
        C: Connector,
        K: Codec,
    {
        let stats = Arc::new(ChannelStats::default());
        let manager = ConnectionManager::new(connector, config, Arc::clone(&stats));
        let state = manager.subscribe();
        let (sender, receiver) = mpsc::channel(COMMAND_QUEUE);

        let task = CorrelatorTask {
            manager,
            codec,
            receiver,
            next_id: RequestId::FIRST,
            pending: None,
            backlog: VecDeque::new(),
            stopping: None,
            stats: Arc::clone(&stats),
        };
        tokio::spawn(task.run());

        Self {
            sender,
            state,
            stats,
        }
    }

    /// Queues `request` and waits for its reply.
    ///
    /// # Errors
    /// Whatever the exchange produced (see [`ChannelError`]), or
    /// [`ChannelError::Shutdown`] if the task is gone.
    pub async fn submit(&self, request: Request) -> Result<Response, ChannelError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(Command::Call {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ChannelError::Shutdown)?;
        reply_rx.await.map_err(|_| ChannelError::Shutdown)?
    }

    /// Refills the retry budget and opens a fresh socket.
    ///
    /// Runs after any calls already queued, and is the way out of
    /// [`ChannelError::ChannelUnavailable`].
    pub async fn reconnect(&self) -> Result<(), ChannelError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(Command::Reconnect { reply: reply_tx })
            .await
            .map_err(|_| ChannelError::Shutdown)?;
        reply_rx.await.map_err(|_| ChannelError::Shutdown)?
    }

    /// Stops the task. Calls still queued fail with
    /// [`ChannelError::Shutdown`]; the socket is closed before this returns.
    ///
    /// Only a call already on the wire is waited for. A reconnect in
    /// progress is abandoned.
    pub async fn shutdown(&self) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .sender
            .send(Command::Shutdown { reply: reply_tx })
            .await
            .is_ok()
        {
            let _ = reply_rx.await;
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// A receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    pub fn stats(&self) -> &ChannelStats {
        &self.stats
    }
}

/// What woke the task up.
enum Event {
    Command(Command),
    /// The idle socket produced a frame, closed, or failed.
    Idle(Result<Option<Vec<u8>>, TransportError>),
    /// Every handle is gone.
    Closed,
}

struct CorrelatorTask<C: Connector, K: Codec> {
    manager: ConnectionManager<C>,
    codec: WireCodec<K>,
    receiver: mpsc::Receiver<Command>,
    next_id: RequestId,
    /// The call currently on the wire. At most one.
    pending: Option<RequestId>,
    /// Commands that arrived while a connect cycle was running.
    backlog: VecDeque<Command>,
    /// A shutdown that overtook the backlog.
    stopping: Option<oneshot::Sender<()>>,
    stats: Arc<ChannelStats>,
}

impl<C: Connector, K: Codec> CorrelatorTask<C, K> {
    async fn run(mut self) {
        tracing::info!(endpoint = %self.manager.endpoint(), "correlator started");

        self.recover().await;

        loop {
            if let Some(ack) = self.stopping.take() {
                self.finish(vec![ack]).await;
                return;
            }

            match self.next_event().await {
                Event::Command(Command::Call { request, reply }) => {
                    if reply.is_closed() {
                        tracing::debug!("caller went away before dispatch, skipping call");
                        continue;
                    }
                    let result = self.dispatch(request).await;
                    let _ = reply.send(result);
                    self.recover().await;
                }
                Event::Command(Command::Reconnect { reply }) => {
                    self.manager.reset_budget();
                    let result = match self.connect_interruptibly().await {
                        Some(result) => result.map(|_| ()),
                        None => Err(ChannelError::Shutdown),
                    };
                    let _ = reply.send(result);
                }
                Event::Command(Command::Shutdown { reply }) => {
                    self.finish(vec![reply]).await;
                    return;
                }
                Event::Idle(outcome) => {
                    self.idle(outcome).await;
                    self.recover().await;
                }
                Event::Closed => break,
            }
        }

        self.finish(Vec::new()).await;
    }

    /// Takes the next command, watching the socket meanwhile if one is open.
    async fn next_event(&mut self) -> Event {
        if let Some(cmd) = self.backlog.pop_front() {
            return Event::Command(cmd);
        }
        let watch_socket = self.manager.is_connected();
        tokio::select! {
            biased;
            outcome = self.manager.recv(), if watch_socket => Event::Idle(outcome),
            cmd = self.receiver.recv() => match cmd {
                Some(cmd) => Event::Command(cmd),
                None => Event::Closed,
            },
        }
    }

    /// Handles traffic on a socket with no call pending.
    async fn idle(&mut self, outcome: Result<Option<Vec<u8>>, TransportError>) {
        match outcome {
            Ok(Some(frame)) => {
                tracing::warn!(len = frame.len(), "unsolicited frame from engine, dropped");
            }
            Ok(None) => {
                tracing::warn!("engine closed the idle connection");
                self.manager.teardown().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "idle connection failed");
                self.manager.teardown().await;
            }
        }
    }

    async fn dispatch(&mut self, request: Request) -> Result<Response, ChannelError> {
        if !self.manager.is_connected() {
            if self.manager.is_exhausted() {
                return Err(ChannelError::ChannelUnavailable {
                    attempts: self.manager.budget().max(),
                });
            }
            self.manager.connect().await?;
        }

        let id = self.next_id;
        self.next_id = id.next();
        let expected = request.response_type();
        let frame = self.codec.encode_request(id, &request)?;

        debug_assert!(self.pending.is_none(), "second call put in flight");
        self.pending = Some(id);
        self.stats.begin_call();
        tracing::debug!(%id, kind = %expected, "dispatching call");

        let result = self.exchange(id, expected, &frame).await;

        self.stats.end_call();
        self.pending = None;
        result
    }

    /// Writes one request frame and reads exactly one reply frame.
    async fn exchange(
        &mut self,
        id: RequestId,
        expected: ResponseType,
        frame: &[u8],
    ) -> Result<Response, ChannelError> {
        self.deliver(id, frame).await?;

        let bytes = match self.manager.recv().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                return Err(
                    self.lose(id, TransportError::ConnectionClosed("closed by engine".into()))
                        .await,
                );
            }
            Err(e @ TransportError::FrameTooLarge { .. }) => {
                tracing::warn!(%id, error = %e, "reply exceeds frame limit");
                self.manager.teardown().await;
                return Err(e.into());
            }
            Err(e) => return Err(self.lose(id, e).await),
        };

        let wire = self.codec.decode_frame(&bytes)?;
        let actual = RequestId(wire.id());
        if actual != id {
            tracing::error!(expected = %id, %actual, "reply id mismatch, dropping socket");
            self.manager.teardown().await;
            return Err(ChannelError::ProtocolDesync {
                expected: id,
                actual,
            });
        }

        let response = Response::from_wire(wire, expected)?;
        tracing::debug!(%id, "call completed");
        Ok(response)
    }

    /// Writes the request frame. A write that fails outright delivered
    /// nothing, so the frame goes out once more on a fresh socket.
    async fn deliver(&mut self, id: RequestId, frame: &[u8]) -> Result<(), ChannelError> {
        match self.manager.send(frame).await {
            Ok(()) => return Ok(()),
            // Nothing was written, so the socket is still in step.
            Err(e @ TransportError::FrameTooLarge { .. }) => return Err(e.into()),
            Err(e) => {
                tracing::warn!(%id, error = %e, "request not delivered, reconnecting");
            }
        }

        self.manager.connect().await?;
        match self.manager.send(frame).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.lose(id, e).await),
        }
    }

    async fn lose(&mut self, id: RequestId, cause: TransportError) -> ChannelError {
        tracing::warn!(%id, error = %cause, "connection lost with call pending");
        self.manager.teardown().await;
        ChannelError::ConnectionLost { id }
    }

    /// Reopens a dropped socket between calls while the budget allows it.
    async fn recover(&mut self) {
        if self.manager.state() != ConnectionState::Disconnected
            || self.manager.is_exhausted()
        {
            return;
        }
        if let Some(Err(e)) = self.connect_interruptibly().await {
            tracing::warn!(error = %e, "reconnect failed");
        }
    }

    /// Runs one connect cycle while still taking commands. Calls and
    /// reconnects that arrive meanwhile wait in the backlog; a shutdown
    /// abandons the cycle and yields `None`, as does losing every handle.
    async fn connect_interruptibly(
        &mut self,
    ) -> Option<Result<ConnectionId, ChannelError>> {
        let connect = self.manager.connect();
        tokio::pin!(connect);

        loop {
            tokio::select! {
                result = &mut connect => return Some(result),
                cmd = self.receiver.recv() => match cmd {
                    Some(Command::Shutdown { reply }) => {
                        tracing::debug!("shutdown requested, abandoning connect");
                        self.stopping = Some(reply);
                        return None;
                    }
                    Some(cmd) => self.backlog.push_back(cmd),
                    None => return None,
                },
            }
        }
    }

    async fn finish(&mut self, mut acks: Vec<oneshot::Sender<()>>) {
        self.receiver.close();
        let mut backlog = std::mem::take(&mut self.backlog);
        while let Some(cmd) = backlog
            .pop_front()
            .or_else(|| self.receiver.try_recv().ok())
        {
            match cmd {
                Command::Call { reply, .. } => {
                    let _ = reply.send(Err(ChannelError::Shutdown));
                }
                Command::Reconnect { reply } => {
                    let _ = reply.send(Err(ChannelError::Shutdown));
                }
                Command::Shutdown { reply } => acks.push(reply),
            }
        }
        self.manager.shutdown().await;
        for ack in acks {
            let _ = ack.send(());
        }
        tracing::info!("correlator stopped");
    }
}
