//! WebSocket client transport using `tokio-tungstenite`.

use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::error::CapacityError;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::{
    Connection, ConnectionId, Connector, Endpoint, TransportError,
    check_frame_size,
};

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// A [`Connector`] that opens WebSocket connections to the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    type Connection = WebSocketConnection;

    async fn connect(
        &self,
        endpoint: &Endpoint,
        max_frame_size: usize,
    ) -> Result<Self::Connection, TransportError> {
        let url = endpoint.url();

        // tungstenite enforces the same limit on inbound frames, so an
        // oversized reply fails while reading instead of being buffered.
        let mut config = WebSocketConfig::default();
        config.max_message_size = Some(max_frame_size);
        config.max_frame_size = Some(max_frame_size);

        let (ws, _) = tokio_tungstenite::connect_async_with_config(
            url.as_str(),
            Some(config),
            true,
        )
        .await
        .map_err(|e| TransportError::ConnectFailed {
            url: url.clone(),
            source: std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ),
        })?;

        let id = ConnectionId::next();
        tracing::debug!(%id, %url, "opened WebSocket connection");

        Ok(WebSocketConnection {
            id,
            max_frame_size,
            ws: Mutex::new(ws),
        })
    }
}

/// A single WebSocket connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    max_frame_size: usize,
    ws: Mutex<WsStream>,
}

impl Connection for WebSocketConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        use futures_util::SinkExt;
        check_frame_size(data.len(), self.max_frame_size)?;
        let msg = Message::Binary(data.to_vec().into());
        self.ws.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        use futures_util::StreamExt;
        loop {
            let msg = self.ws.lock().await.next().await;
            match msg {
                Some(Ok(Message::Binary(data))) => {
                    check_frame_size(data.len(), self.max_frame_size)?;
                    return Ok(Some(data.into()));
                }
                Some(Ok(Message::Text(text))) => {
                    check_frame_size(text.as_bytes().len(), self.max_frame_size)?;
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(tungstenite::Error::Capacity(
                    CapacityError::MessageTooLong { size, max_size },
                ))) => {
                    tracing::warn!(id = %self.id, size, max_size, "inbound frame too large");
                    return Err(TransportError::FrameTooLarge {
                        size,
                        max: max_size,
                    });
                }
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        match self.ws.lock().await.close(None).await {
            Ok(())
            | Err(tungstenite::Error::ConnectionClosed)
            | Err(tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))),
        }
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
