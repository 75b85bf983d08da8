//! WebSocket connection handlers.
//!
//! Each connection goes through the join handshake in the upgrade task, then
//! runs two tasks: a receive loop that routes inbound messages and a pusher
//! loop that drains the client's outbound queue into the socket.

use std::{fmt::Display, sync::Arc, time::Duration};

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::{Sink, SinkExt},
    stream::{SplitStream, Stream, StreamExt},
};
use tokio::{sync::mpsc, task::JoinHandle, time::timeout};

use crate::{
    domain::{ClientHandle, ClientName, ConnectionCloser, Room, Timestamp},
    ui::state::AppState,
    usecase::{JoinError, JoinRequest, RelayOutcome},
};
use tsunagi_shared::time::now_millis;

/// How long a departing client's remaining queue may take to flush.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);
/// How long the closing handshake write may block.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("New WebSocket connection attempt");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Decode a data frame as text. `Ok(None)` for control frames.
fn frame_text(msg: Message) -> Result<Option<String>, FrameEnd> {
    match msg {
        Message::Text(text) => Ok(Some(text.as_str().to_owned())),
        Message::Binary(bytes) => String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|_| FrameEnd::NotUtf8),
        Message::Ping(_) | Message::Pong(_) => Ok(None),
        Message::Close(_) => Err(FrameEnd::Closed),
    }
}

enum FrameEnd {
    Closed,
    NotUtf8,
}

/// Read frames until the first data message and parse it as a join.
///
/// Strict: whatever the first data message is, a failure closes the
/// connection. Ping/Pong frames are skipped.
async fn read_join_request<S>(receiver: &mut S) -> Result<JoinRequest, JoinError>
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(frame) = receiver.next().await {
        let msg = frame.map_err(|e| JoinError::Transport(e.to_string()))?;
        let text = match frame_text(msg) {
            Ok(Some(text)) => text,
            Ok(None) => continue,
            Err(FrameEnd::Closed) => return Err(JoinError::ConnectionClosed),
            Err(FrameEnd::NotUtf8) => return Err(JoinError::NotUtf8),
        };
        tracing::debug!("Initial message received: {}", text);
        return JoinRequest::parse(&text);
    }
    Err(JoinError::ConnectionClosed)
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let request = match read_join_request(&mut receiver).await {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Invalid join, closing connection: {}", e);
            if let Err(e) = sender.close().await {
                tracing::debug!("Failed to close unjoined connection: {}", e);
            }
            return;
        }
    };

    // Create the bounded outbound queue for this client
    let (tx, rx) = mpsc::channel(state.queue_capacity.get());
    let closer = ConnectionCloser::new();
    let client = ClientHandle::new(
        request.name.clone(),
        tx,
        closer.clone(),
        Timestamp::new(now_millis()),
    );

    let room = match state
        .join_room_usecase
        .execute(request, client.clone())
        .await
    {
        Ok(room) => room,
        Err(e) => {
            tracing::error!("Failed to join client '{}': {}", client.name(), e);
            if let Err(e) = sender.close().await {
                tracing::debug!("Failed to close unjoined connection: {}", e);
            }
            return;
        }
    };

    // Setup is complete: start draining and reading
    let mut send_task = pusher_loop(rx, sender, closer.clone(), client.name().clone());
    let recv_task = receiver_loop(
        receiver,
        state.clone(),
        room.clone(),
        client.name().clone(),
        closer.clone(),
    );

    if let Err(e) = recv_task.await {
        tracing::error!("Receive task for '{}' failed: {}", client.name(), e);
    }

    // Removing the entry drops the room's queue sender; dropping ours closes
    // the queue so the pusher loop flushes and exits.
    state.leave_room_usecase.execute(&room, &client).await;
    let client_name = client.name().clone();
    drop(client);

    let joined = match timeout(DRAIN_TIMEOUT, &mut send_task).await {
        Ok(joined) => joined,
        Err(_) => {
            tracing::warn!(
                "Outbound queue for '{}' did not drain in {:?}; closing",
                client_name,
                DRAIN_TIMEOUT
            );
            closer.close();
            send_task.await
        }
    };
    if let Err(e) = joined {
        tracing::error!("Pusher task for '{}' failed: {}", client_name, e);
    }
    tracing::info!("Connection for '{}' closed", client_name);
}

/// Spawns a task that routes messages read from this client.
///
/// Ends on peer close, transport error, a `leave` message, or when the
/// connection is closed from the server side.
fn receiver_loop(
    mut receiver: SplitStream<WebSocket>,
    state: Arc<AppState>,
    room: Arc<Room>,
    client_name: ClientName,
    closer: ConnectionCloser,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                _ = closer.closed() => {
                    tracing::info!("Connection for '{}' closed by server", client_name);
                    break;
                }
                frame = receiver.next() => frame,
            };

            let msg = match frame {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => {
                    tracing::warn!("ReadMessage error for '{}': {}", client_name, e);
                    break;
                }
                None => break,
            };

            let text = match frame_text(msg) {
                Ok(Some(text)) => text,
                Ok(None) => continue,
                Err(FrameEnd::Closed) => {
                    tracing::info!("Client '{}' requested close", client_name);
                    break;
                }
                Err(FrameEnd::NotUtf8) => {
                    tracing::warn!("Discarding non UTF-8 binary frame from '{}'", client_name);
                    continue;
                }
            };
            tracing::debug!("Message received from client '{}': {}", client_name, text);

            let outcome = state
                .relay_message_usecase
                .execute(&room, &client_name, &text)
                .await;
            if outcome == RelayOutcome::Leave {
                break;
            }
        }
    })
}

/// Spawns a task that drains the outbound queue into the WebSocket sink.
///
/// Messages are written one at a time in enqueue order. Once every queue
/// sender is gone the remaining buffer is flushed and a Close frame is sent.
/// When `closer` fires the backlog is abandoned, even mid-write, and the
/// connection is closed straight away. A failed write fires `closer` so the
/// receive loop stops too.
fn pusher_loop<S>(
    mut rx: mpsc::Receiver<Arc<str>>,
    sender: S,
    closer: ConnectionCloser,
    client_name: ClientName,
) -> JoinHandle<()>
where
    S: Sink<Message> + Send + 'static,
    S::Error: Display,
{
    tokio::spawn(async move {
        tokio::pin!(sender);

        loop {
            let msg = tokio::select! {
                biased;
                _ = closer.closed() => break,
                msg = rx.recv() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
            };

            let result = tokio::select! {
                biased;
                _ = closer.closed() => break,
                result = sender.send(Message::Text(msg.as_ref().into())) => result,
            };
            if let Err(e) = result {
                tracing::warn!("WriteMessage error for '{}': {}", client_name, e);
                closer.close();
                return;
            }
            tracing::debug!("Message sent to client '{}'", client_name);
        }

        if closer.is_closed() {
            tracing::info!(
                "Discarding {} queued message(s) for '{}'",
                rx.len(),
                client_name
            );
        }
        match timeout(CLOSE_TIMEOUT, sender.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!("Failed to close connection for '{}': {}", client_name, e)
            }
            Err(_) => tracing::debug!("Close handshake for '{}' timed out", client_name),
        }
    })
}
