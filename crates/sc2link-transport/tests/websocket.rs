//! Integration tests for the WebSocket connector.
//!
//! These tests spin up a bare `tokio-tungstenite` server on a random port
//! and point the connector at it, so bytes really cross a socket.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use sc2link_transport::{
        Connection, Connector, Endpoint, TransportError, WebSocketConnector,
    };
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;

    type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

    /// Binds a listener on a random port and returns it with its endpoint.
    async fn bind() -> (TcpListener, Endpoint) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let port = listener.local_addr().expect("local addr").port();
        (listener, Endpoint::new("127.0.0.1", port, "/sc2api"))
    }

    async fn accept(listener: &TcpListener) -> ServerWs {
        let (stream, _) = listener.accept().await.expect("accept");
        tokio_tungstenite::accept_async(stream)
            .await
            .expect("handshake")
    }

    #[tokio::test]
    async fn test_websocket_send_and_receive() {
        let (listener, endpoint) = bind().await;

        let server = tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            let msg = ws.next().await.unwrap().unwrap();
            assert_eq!(msg.into_data().to_vec(), b"request".to_vec());
            ws.send(Message::Binary(b"response".to_vec().into()))
                .await
                .unwrap();
        });

        let conn = WebSocketConnector
            .connect(&endpoint, 1024)
            .await
            .expect("should connect");
        conn.send(b"request").await.expect("send");
        let reply = conn.recv().await.expect("recv");
        assert_eq!(reply, Some(b"response".to_vec()));

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_close() {
        let (listener, endpoint) = bind().await;

        tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            ws.close(None).await.unwrap();
        });

        let conn = WebSocketConnector.connect(&endpoint, 1024).await.unwrap();
        let result = conn.recv().await.expect("clean close is not an error");
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_websocket_connect_refused() {
        // Bind then drop, so the port is (almost certainly) free.
        let (listener, endpoint) = bind().await;
        drop(listener);

        let err = WebSocketConnector
            .connect(&endpoint, 1024)
            .await
            .err()
            .expect("nobody is listening");
        assert!(err.is_connect_error());
    }

    #[tokio::test]
    async fn test_websocket_oversized_send_fails_before_writing() {
        let (listener, endpoint) = bind().await;

        let server = tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            // The first frame to arrive must be the small one.
            let msg = ws.next().await.unwrap().unwrap();
            msg.into_data().to_vec()
        });

        let conn = WebSocketConnector.connect(&endpoint, 16).await.unwrap();
        let err = conn.send(&[0u8; 17]).await.unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge { size: 17, max: 16 }));

        conn.send(b"small").await.unwrap();
        let received = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server should finish")
            .unwrap();
        assert_eq!(received, b"small".to_vec());
    }

    #[tokio::test]
    async fn test_websocket_oversized_recv_fails() {
        let (listener, endpoint) = bind().await;

        tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            let _ = ws.send(Message::Binary(vec![7u8; 4096].into())).await;
            // Keep the socket open until the client gives up.
            let _ = ws.next().await;
        });

        let conn = WebSocketConnector.connect(&endpoint, 1024).await.unwrap();
        let err = conn.recv().await.unwrap_err();
        assert!(
            matches!(err, TransportError::FrameTooLarge { max: 1024, .. }),
            "unexpected error: {err:?}"
        );
    }
}
