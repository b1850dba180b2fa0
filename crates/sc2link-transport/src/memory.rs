//! In-process transport: a connector whose "remote" side is a
//! [`MemoryListener`] living in the same process.
//!
//! Every successful [`MemoryConnector::connect`] creates a fresh pair of
//! [`MemoryConnection`]s linked by two unbounded channels, one per
//! direction. The client half enforces the frame limit on both send and
//! receive; the listener half does not, so a fake engine can deliberately
//! send oversized replies.
//!
//! Connection attempts can be scripted to fail ([`MemoryConnector::fail_next`])
//! or to never complete ([`MemoryConnector::hang_next`]), and the connector
//! counts every attempt it sees.

use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, mpsc};

use crate::{
    Connection, ConnectionId, Connector, Endpoint, TransportError,
    check_frame_size,
};

#[derive(Debug, Default)]
struct Script {
    attempts: usize,
    fail_next: usize,
    hang_next: usize,
}

/// A [`Connector`] that hands the remote end of each connection to a
/// [`MemoryListener`].
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    acceptor: mpsc::UnboundedSender<MemoryConnection>,
    script: Arc<StdMutex<Script>>,
}

/// Receives the engine-side half of every connection opened through the
/// paired [`MemoryConnector`].
///
/// Dropping the listener makes every later connection attempt fail, like
/// a port nobody is listening on.
#[derive(Debug)]
pub struct MemoryListener {
    incoming: mpsc::UnboundedReceiver<MemoryConnection>,
}

impl MemoryListener {
    /// Waits for the next connection. Returns `None` once every connector
    /// clone has been dropped.
    pub async fn accept(&mut self) -> Option<MemoryConnection> {
        self.incoming.recv().await
    }
}

impl MemoryConnector {
    /// Creates a connector and the listener that receives its connections.
    pub fn new() -> (Self, MemoryListener) {
        let (acceptor, incoming) = mpsc::unbounded_channel();
        (
            Self {
                acceptor,
                script: Arc::default(),
            },
            MemoryListener { incoming },
        )
    }

    /// Makes the next `n` connection attempts fail immediately.
    pub fn fail_next(&self, n: usize) {
        self.script().fail_next += n;
    }

    /// Makes the next `n` connection attempts hang forever. Callers are
    /// expected to bound them with a timeout.
    pub fn hang_next(&self, n: usize) {
        self.script().hang_next += n;
    }

    /// Total number of connection attempts made so far.
    pub fn attempts(&self) -> usize {
        self.script().attempts
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        // A poisoned script only means a test thread panicked mid-update;
        // the counters are still usable.
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// What a scripted attempt should do.
enum Outcome {
    Fail,
    Hang,
    Proceed,
}

impl Connector for MemoryConnector {
    type Connection = MemoryConnection;

    async fn connect(
        &self,
        endpoint: &Endpoint,
        max_frame_size: usize,
    ) -> Result<Self::Connection, TransportError> {
        let outcome = {
            let mut script = self.script();
            script.attempts += 1;
            if script.hang_next > 0 {
                script.hang_next -= 1;
                Outcome::Hang
            } else if script.fail_next > 0 {
                script.fail_next -= 1;
                Outcome::Fail
            } else {
                Outcome::Proceed
            }
        };

        match outcome {
            Outcome::Hang => std::future::pending().await,
            Outcome::Fail => return Err(refused(endpoint)),
            Outcome::Proceed => {}
        }

        let (client, server) = MemoryConnection::pair(max_frame_size);
        self.acceptor.send(server).map_err(|_| refused(endpoint))?;
        tracing::debug!(id = %client.id, %endpoint, "opened in-memory connection");
        Ok(client)
    }
}

fn refused(endpoint: &Endpoint) -> TransportError {
    TransportError::ConnectFailed {
        url: endpoint.url(),
        source: std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "no listener",
        ),
    }
}

/// One end of an in-memory, message-framed connection.
#[derive(Debug)]
pub struct MemoryConnection {
    id: ConnectionId,
    max_frame_size: usize,
    tx: StdMutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    rx: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl MemoryConnection {
    /// Creates a linked `(client, server)` pair. Only the client half
    /// enforces `max_frame_size`.
    pub fn pair(max_frame_size: usize) -> (Self, Self) {
        let (client_tx, server_rx) = mpsc::unbounded_channel();
        let (server_tx, client_rx) = mpsc::unbounded_channel();
        let client = Self {
            id: ConnectionId::next(),
            max_frame_size,
            tx: StdMutex::new(Some(client_tx)),
            rx: Mutex::new(client_rx),
        };
        let server = Self {
            id: ConnectionId::next(),
            max_frame_size: usize::MAX,
            tx: StdMutex::new(Some(server_tx)),
            rx: Mutex::new(server_rx),
        };
        (client, server)
    }

    fn sender(&self) -> Option<mpsc::UnboundedSender<Vec<u8>>> {
        self.tx.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Connection for MemoryConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        check_frame_size(data.len(), self.max_frame_size)?;
        let tx = self.sender().ok_or_else(|| {
            TransportError::ConnectionClosed("closed locally".into())
        })?;
        tx.send(data.to_vec()).map_err(|_| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "peer dropped",
            ))
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        match self.rx.lock().await.recv().await {
            Some(data) => {
                check_frame_size(data.len(), self.max_frame_size)?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        // Dropping our sender is what the peer observes as a close.
        self.tx.lock().unwrap_or_else(|e| e.into_inner()).take();
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Endpoint {
        Endpoint::new("127.0.0.1", 5000, "/sc2api")
    }

    #[tokio::test]
    async fn test_connect_and_exchange() {
        let (connector, mut listener) = MemoryConnector::new();
        let client = connector.connect(&endpoint(), 1024).await.unwrap();
        let server = listener.accept().await.unwrap();

        client.send(b"ping").await.unwrap();
        assert_eq!(server.recv().await.unwrap(), Some(b"ping".to_vec()));

        server.send(b"pong").await.unwrap();
        assert_eq!(client.recv().await.unwrap(), Some(b"pong".to_vec()));
        assert_eq!(connector.attempts(), 1);
    }

    #[tokio::test]
    async fn test_each_connect_is_a_fresh_connection() {
        let (connector, _listener) = MemoryConnector::new();
        let a = connector.connect(&endpoint(), 1024).await.unwrap();
        let b = connector.connect(&endpoint(), 1024).await.unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_scripted_failures_are_counted() {
        let (connector, _listener) = MemoryConnector::new();
        connector.fail_next(2);

        assert!(connector.connect(&endpoint(), 1024).await.is_err());
        assert!(connector.connect(&endpoint(), 1024).await.is_err());
        assert!(connector.connect(&endpoint(), 1024).await.is_ok());
        assert_eq!(connector.attempts(), 3);
    }

    #[tokio::test]
    async fn test_connect_fails_without_listener() {
        let (connector, listener) = MemoryConnector::new();
        drop(listener);
        let err = connector.connect(&endpoint(), 1024).await.unwrap_err();
        assert!(err.is_connect_error());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hang_next_never_completes() {
        let (connector, _listener) = MemoryConnector::new();
        connector.hang_next(1);
        let result = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            connector.connect(&endpoint(), 1024),
        )
        .await;
        assert!(result.is_err(), "attempt should still be pending");
    }

    #[tokio::test]
    async fn test_oversized_send_is_rejected_without_delivery() {
        let (client, server) = MemoryConnection::pair(4);
        let err = client.send(b"too long").await.unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge { size: 8, max: 4 }));

        client.send(b"ok").await.unwrap();
        // Only the small frame made it across.
        assert_eq!(server.recv().await.unwrap(), Some(b"ok".to_vec()));
    }

    #[tokio::test]
    async fn test_oversized_recv_is_rejected() {
        let (client, server) = MemoryConnection::pair(4);
        server.send(b"way too long").await.unwrap();
        let err = client.recv().await.unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge { size: 12, max: 4 }));
    }

    #[tokio::test]
    async fn test_close_is_observed_by_peer() {
        let (client, server) = MemoryConnection::pair(1024);
        client.close().await.unwrap();
        assert_eq!(server.recv().await.unwrap(), None);
        assert!(client.send(b"x").await.is_err());
    }
}
