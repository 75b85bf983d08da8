//! Server execution logic.

use std::{num::NonZeroUsize, sync::Arc};

use axum::{Router, routing::get};
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::usecase::{
    GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase, LeaveRoomUseCase, RelayMessageUseCase,
};

use super::{
    handler::{get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// WebSocket signaling server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     join_room_usecase,
///     relay_message_usecase,
///     leave_room_usecase,
///     get_rooms_usecase,
///     get_room_detail_usecase,
///     queue_capacity,
/// );
/// server.run("127.0.0.1".to_string(), 3000).await?;
/// ```
pub struct Server {
    /// JoinRoomUseCase（join ハンドシェイクのユースケース）
    join_room_usecase: Arc<JoinRoomUseCase>,
    /// RelayMessageUseCase（メッセージ中継のユースケース）
    relay_message_usecase: Arc<RelayMessageUseCase>,
    /// LeaveRoomUseCase（退出のユースケース）
    leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// Capacity of each client's outbound queue
    queue_capacity: NonZeroUsize,
}

impl Server {
    pub fn new(
        join_room_usecase: Arc<JoinRoomUseCase>,
        relay_message_usecase: Arc<RelayMessageUseCase>,
        leave_room_usecase: Arc<LeaveRoomUseCase>,
        get_rooms_usecase: Arc<GetRoomsUseCase>,
        get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
        queue_capacity: NonZeroUsize,
    ) -> Self {
        Self {
            join_room_usecase,
            relay_message_usecase,
            leave_room_usecase,
            get_rooms_usecase,
            get_room_detail_usecase,
            queue_capacity,
        }
    }

    /// Build the axum router without binding a socket.
    pub fn router(self) -> Router {
        let app_state = Arc::new(AppState {
            join_room_usecase: self.join_room_usecase,
            relay_message_usecase: self.relay_message_usecase,
            leave_room_usecase: self.leave_room_usecase,
            get_rooms_usecase: self.get_rooms_usecase,
            get_room_detail_usecase: self.get_room_detail_usecase,
            queue_capacity: self.queue_capacity,
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{name}", get(get_room_detail))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the signaling server until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), ServerError> {
        let app = self.router();

        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: bind_addr.clone(),
                source,
            })?;

        tracing::info!(
            "WebSocket signaling server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
