//! Integration tests for `S2Client` against a fake engine speaking the
//! wire protocol over a real WebSocket.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use sc2link::prelude::*;
use sc2link::protocol::{WireCodec, wire};
use sc2link::transport::{Connection, MemoryConnector};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request as HsRequest, Response as HsResponse,
};

// =========================================================================
// Fake engine
// =========================================================================

fn reply_to(req: &wire::Request) -> wire::Response {
    let body = match &req.request {
        Some(wire::RequestBody::GameInfo(_)) => {
            wire::ResponseBody::GameInfo(wire::ResponseGameInfo {
                map_name: Some("Simple64".into()),
                mod_names: vec!["Mods/Liberty.SC2Mod".into()],
                local_map_path: None,
                player_info: vec![
                    wire::PlayerInfo {
                        player_id: Some(1),
                        player_type: Some(PlayerType::Participant.into()),
                        race_requested: Some(Race::Terran.into()),
                        race_actual: Some(Race::Terran.into()),
                    },
                    wire::PlayerInfo {
                        player_id: Some(2),
                        player_type: Some(PlayerType::Computer.into()),
                        race_requested: Some(Race::Random.into()),
                        race_actual: Some(Race::Zerg.into()),
                    },
                ],
                options: Some(InterfaceOptions::raw().into()),
            })
        }
        Some(wire::RequestBody::Step(step)) => {
            wire::ResponseBody::Step(wire::ResponseStep {
                simulation_loop: step.count,
            })
        }
        Some(wire::RequestBody::QuickSave(e)) => wire::ResponseBody::QuickSave(*e),
        Some(wire::RequestBody::QuickLoad(e)) => wire::ResponseBody::QuickLoad(*e),
        Some(wire::RequestBody::LeaveGame(e)) => wire::ResponseBody::LeaveGame(*e),
        _ => wire::ResponseBody::Ping(wire::ResponsePing {
            game_version: Some("4.10.0".into()),
            data_version: Some("B89B5D6FA7CBF6452E721311BFBC6CB2".into()),
            data_build: Some(75689),
            base_build: Some(75689),
        }),
    };
    wire::Response::reply(req.id, body)
}

struct Engine {
    port: u16,
    /// Request paths seen during the WebSocket handshake.
    paths: mpsc::UnboundedReceiver<String>,
    /// Signalled when a connection's stream ends.
    closed: mpsc::UnboundedReceiver<()>,
}

/// Starts a fake engine on a random port. It answers every request, except
/// that the request numbered `hang_up_on` (counting from 1 across all
/// connections) is met by closing the socket.
async fn start_engine(hang_up_on: Option<usize>) -> Engine {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let port = listener.local_addr().expect("local addr").port();
    let (path_tx, paths) = mpsc::unbounded_channel();
    let (closed_tx, closed) = mpsc::unbounded_channel();
    let seen = Arc::new(AtomicUsize::new(0));

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let path_tx = path_tx.clone();
            let closed_tx = closed_tx.clone();
            let seen = Arc::clone(&seen);
            tokio::spawn(async move {
                let callback = |req: &HsRequest,
                                resp: HsResponse|
                 -> Result<HsResponse, ErrorResponse> {
                    let _ = path_tx.send(req.uri().path().to_string());
                    Ok(resp)
                };
                let Ok(mut ws) =
                    tokio_tungstenite::accept_hdr_async(stream, callback).await
                else {
                    return;
                };
                let codec = WireCodec::protobuf();
                while let Some(Ok(msg)) = ws.next().await {
                    if !msg.is_binary() {
                        continue;
                    }
                    let n = seen.fetch_add(1, Ordering::SeqCst) + 1;
                    if Some(n) == hang_up_on {
                        let _ = ws.close(None).await;
                        break;
                    }
                    let req = codec
                        .decode_request(&msg.into_data())
                        .expect("decode request");
                    let bytes =
                        codec.encode_response(&reply_to(&req)).expect("encode");
                    if ws.send(Message::Binary(bytes.into())).await.is_err() {
                        break;
                    }
                }
                let _ = closed_tx.send(());
            });
        }
    });

    Engine {
        port,
        paths,
        closed,
    }
}

fn client_for(port: u16) -> S2Client {
    S2Client::builder()
        .host("127.0.0.1")
        .port(port)
        .retry_attempts(3)
        .retry_backoff(Duration::from_millis(10), Duration::ZERO)
        .build()
}

// =========================================================================
// WebSocket
// =========================================================================

#[tokio::test]
async fn test_ping_over_websocket() {
    let mut engine = start_engine(None).await;
    let client = client_for(engine.port);

    let ping = client.ping().await.expect("ping");
    assert_eq!(ping.game_version, "4.10.0");
    assert_eq!(ping.base_build, 75689);
    assert_eq!(engine.paths.recv().await.as_deref(), Some("/sc2api"));
    assert_eq!(client.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_game_info_and_quick_save() {
    let engine = start_engine(None).await;
    let client = client_for(engine.port);

    let info = client.game_info().await.expect("game info");
    assert_eq!(info.map_name, "Simple64");
    assert_eq!(info.mod_names, vec!["Mods/Liberty.SC2Mod".to_string()]);
    assert_eq!(info.players_info.len(), 2);
    assert_eq!(info.players_info[1].race_actual, Some(Race::Zerg));
    assert!(info.interface_options.raw);

    let saved = client.quick_save().await.expect("quick save");
    assert_eq!(saved.status(), GameStatus::Launched);
    assert!(matches!(saved.kind(), ResponseKind::QuickSave));
}

#[tokio::test]
async fn test_clones_share_one_ordered_channel() {
    let engine = start_engine(None).await;
    let client = client_for(engine.port);

    let mut handles = Vec::new();
    for i in 0..10u32 {
        let c = client.clone();
        handles.push(tokio::spawn(async move {
            let step = c.step(i).await.expect("step");
            assert_eq!(step.simulation_loop, Some(i));
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    assert_eq!(client.stats().max_in_flight(), 1);
    assert_eq!(client.stats().connects(), 1);
}

#[tokio::test]
async fn test_engine_hang_up_surfaces_connection_lost() {
    let engine = start_engine(Some(2)).await;
    let client = client_for(engine.port);

    client.ping().await.expect("first ping");
    let err = client.ping().await.unwrap_err();
    assert!(err.is_connection_lost(), "got {err:?}");

    // The channel reconnects on its own for the next call.
    client.ping().await.expect("ping after reconnect");
    assert_eq!(client.stats().connects(), 2);
}

#[tokio::test]
async fn test_unreachable_engine_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = S2Client::builder()
        .port(port)
        .retry_attempts(2)
        .retry_backoff(Duration::from_millis(5), Duration::ZERO)
        .build();

    let err = client.ping().await.unwrap_err();
    assert!(err.is_channel_unavailable(), "got {err:?}");
    assert_eq!(client.stats().connect_attempts(), 2);
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_shutdown_closes_socket() {
    let mut engine = start_engine(None).await;
    let client = client_for(engine.port);
    client.ping().await.expect("ping");

    client.shutdown().await;
    assert_eq!(client.state(), ConnectionState::Closed);
    assert_eq!(engine.closed.recv().await, Some(()));

    let err = client.ping().await.unwrap_err();
    assert!(err.is_shutdown());
}

// =========================================================================
// In-memory
// =========================================================================

#[tokio::test]
async fn test_client_over_memory_transport() {
    let (connector, mut listener) = MemoryConnector::new();
    let client = S2Client::builder().build_with(connector);

    tokio::spawn(async move {
        let conn = listener.accept().await.expect("accept");
        let codec = WireCodec::protobuf();
        while let Ok(Some(frame)) = conn.recv().await {
            let req = codec.decode_request(&frame).unwrap();
            // A game info reply that lost its map name.
            let mut resp = reply_to(&req);
            if let Some(wire::ResponseBody::GameInfo(info)) = &mut resp.response {
                info.map_name = None;
            }
            conn.send(&codec.encode_response(&resp).unwrap())
                .await
                .unwrap();
        }
    });

    let step = client.step(8).await.expect("step");
    assert_eq!(step.simulation_loop, Some(8));

    let err = client.game_info().await.unwrap_err();
    assert!(err.is_malformed_response());
    assert_eq!(err.to_string(), "malformed response: map name is required");

    client.leave_game().await.expect("leave game");
}

#[tokio::test]
async fn test_invalid_request_fails_before_reaching_engine() {
    let (connector, _listener) = MemoryConnector::new();
    let client = S2Client::builder().build_with(connector);

    let result: Result<Response, S2Error> = async {
        let create = RequestCreateGame::builder()
            .with_player_setup([PlayerSetup::participant()])
            .build()?;
        client.call(create).await
    }
    .await;

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "one of map data is required");
    assert_eq!(client.stats().calls_dispatched(), 0);
}

#[cfg(feature = "json")]
#[tokio::test]
async fn test_client_with_json_codec() {
    use sc2link::protocol::JsonCodec;

    let (connector, mut listener) = MemoryConnector::new();
    let client = S2Client::builder().codec(JsonCodec).build_with(connector);

    tokio::spawn(async move {
        let conn = listener.accept().await.expect("accept");
        let codec = WireCodec::new(JsonCodec);
        while let Ok(Some(frame)) = conn.recv().await {
            assert_eq!(frame.first(), Some(&b'{'));
            let req = codec.decode_request(&frame).unwrap();
            conn.send(&codec.encode_response(&reply_to(&req)).unwrap())
                .await
                .unwrap();
        }
    });

    let ping = client.ping().await.expect("ping");
    assert_eq!(ping.data_build, 75689);
}
