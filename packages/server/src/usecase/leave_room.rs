//! UseCase: ルーム退出処理
//!
//! 読み込みループの終了時（切断・エラー・leave メッセージ）に呼ばれ、
//! ルームからクライアントを削除し、残りのメンバーに leave を通知する。

use crate::{
    domain::{ClientHandle, Room},
    infrastructure::dto::websocket::LeaveMessage,
};

/// ルーム退出のユースケース
#[derive(Debug, Default)]
pub struct LeaveRoomUseCase;

impl LeaveRoomUseCase {
    pub fn new() -> Self {
        Self
    }

    /// `client` を `room` から削除する
    ///
    /// Returns `false` when the client had already been replaced by a
    /// same-name rejoin; no `leave` is broadcast in that case.
    pub async fn execute(&self, room: &Room, client: &ClientHandle) -> bool {
        let notice = serde_json::to_string(&LeaveMessage::new(client.name().as_str()))
            .inspect_err(|e| tracing::error!("Failed to encode leave message: {}", e))
            .ok();

        let removed = room
            .remove(client.name(), client.id(), notice.as_deref())
            .await;

        if removed {
            tracing::info!(
                "Client '{}' disconnected from room '{}'",
                client.name(),
                room.name()
            );
        } else {
            tracing::info!(
                "Client '{}' ({}) left room '{}' after being replaced",
                client.name(),
                client.id(),
                room.name()
            );
        }
        removed
    }
}
