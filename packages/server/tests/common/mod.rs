//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::{net::SocketAddr, num::NonZeroUsize, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use tokio::{net::TcpListener, net::TcpStream, time::timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tsunagi_server::{
    infrastructure::repository::InMemoryRoomRegistry,
    ui::Server,
    usecase::{
        GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase, LeaveRoomUseCase,
        RelayMessageUseCase, UnroutedPolicy,
    },
};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const SILENCE_WINDOW: Duration = Duration::from_millis(200);

/// Start a server on an ephemeral port and return its address.
pub async fn spawn_server(unrouted: UnroutedPolicy) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");

    let registry = Arc::new(InMemoryRoomRegistry::new());
    let server = Server::new(
        Arc::new(JoinRoomUseCase::new(registry.clone())),
        Arc::new(RelayMessageUseCase::new(unrouted)),
        Arc::new(LeaveRoomUseCase::new()),
        Arc::new(GetRoomsUseCase::new(registry.clone())),
        Arc::new(GetRoomDetailUseCase::new(registry)),
        NonZeroUsize::new(256).expect("non-zero capacity"),
    );

    tokio::spawn(async move {
        axum::serve(listener, server.router())
            .await
            .expect("Test server failed");
    });

    addr
}

pub async fn connect(addr: SocketAddr) -> WsClient {
    let (ws, _response) = connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("Failed to connect");
    ws
}

pub async fn send_text(ws: &mut WsClient, text: &str) {
    ws.send(Message::text(text.to_string()))
        .await
        .expect("Failed to send message");
}

pub async fn send_binary(ws: &mut WsClient, text: &str) {
    ws.send(Message::binary(text.as_bytes().to_vec()))
        .await
        .expect("Failed to send binary message");
}

pub async fn send_ping(ws: &mut WsClient) {
    ws.send(Message::Ping(b"keepalive".to_vec().into()))
        .await
        .expect("Failed to send ping");
}

/// Connect and send a join message. The user-list is left unread.
pub async fn join(addr: SocketAddr, name: &str, room: &str) -> WsClient {
    let mut ws = connect(addr).await;
    let join = serde_json::json!({"type": "join", "name": name, "room": room});
    send_text(&mut ws, &join.to_string()).await;
    ws
}

/// Next text frame, skipping ping/pong.
pub async fn recv_text(ws: &mut WsClient) -> String {
    loop {
        let frame = timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for a message")
            .expect("Connection ended while waiting for a message")
            .expect("WebSocket error while waiting for a message");
        match frame {
            Message::Text(text) => return text.as_str().to_owned(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("Unexpected frame: {other:?}"),
        }
    }
}

pub async fn recv_json(ws: &mut WsClient) -> serde_json::Value {
    let text = recv_text(ws).await;
    serde_json::from_str(&text).expect("Server sent invalid JSON")
}

/// Assert nothing arrives within a short window.
pub async fn assert_silent(ws: &mut WsClient) {
    if let Ok(frame) = timeout(SILENCE_WINDOW, ws.next()).await {
        panic!("Expected silence, got {frame:?}");
    }
}

/// Wait until the server closes the connection.
pub async fn expect_closed(ws: &mut WsClient) {
    loop {
        let frame = timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for the connection to close");
        match frame {
            None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return,
            Some(Ok(_)) => continue,
        }
    }
}

/// Count the text frames that still arrive before the server closes the
/// connection.
pub async fn count_frames_until_closed(ws: &mut WsClient) -> usize {
    let mut received = 0;
    loop {
        let frame = timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for the connection to close");
        match frame {
            None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return received,
            Some(Ok(Message::Text(_))) => received += 1,
            Some(Ok(_)) => continue,
        }
    }
}
