//! UseCase: ルーム参加処理（join ハンドシェイク）
//!
//! ## 処理の流れ
//!
//! 1. 最初のメッセージを join として解釈する（厳格モード: 失敗したら切断）
//! 2. Registry からルームを取得（無ければ作成）
//! 3. ルームにクライアントを登録（同名がいれば追い出す）
//! 4. 新規クライアント自身に user-list を送る
//! 5. 他のメンバーに new-user をブロードキャストする
//!
//! 読み込み・書き込みループはこの処理が完了してから開始されます。

use std::sync::Arc;

use crate::{
    domain::{ClientHandle, ClientName, Room, RoomName, RoomRegistry},
    infrastructure::dto::websocket::{JoinMessage, NewUserMessage, UserListMessage},
};

use super::error::JoinError;

const JOIN_TYPE: &str = "join";

/// Validated contents of a join message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    pub name: ClientName,
    pub room: RoomName,
}

impl JoinRequest {
    /// Parse and validate the raw first message of a connection.
    pub fn parse(raw: &str) -> Result<Self, JoinError> {
        let message: JoinMessage =
            serde_json::from_str(raw).map_err(|e| JoinError::Malformed(e.to_string()))?;

        if message.r#type != JOIN_TYPE {
            return Err(JoinError::UnexpectedType(message.r#type));
        }

        Ok(Self {
            name: ClientName::new(message.name)?,
            room: RoomName::new(message.room)?,
        })
    }
}

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    /// Registry（ルーム表の抽象化）
    registry: Arc<dyn RoomRegistry>,
}

impl JoinRoomUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// 参加処理を実行
    ///
    /// `client` must be built for `request.name`. Returns the room the client
    /// now belongs to.
    pub async fn execute(
        &self,
        request: JoinRequest,
        client: ClientHandle,
    ) -> Result<Arc<Room>, JoinError> {
        let new_user = serde_json::to_string(&NewUserMessage::new(client.name().as_str()))
            .map_err(|e| JoinError::Encode(e.to_string()))?;

        tracing::info!(
            "Client '{}' is joining room '{}'",
            request.name,
            request.room
        );

        // 1. ルームの取得または作成
        let room = self.registry.get_or_create_room(request.room).await;

        // 2. ルームへの登録（同名クライアントは追い出される）
        room.admit(client.clone()).await;

        // 3. user-list を本人のキューに積む
        let others: Vec<String> = room
            .list_other_names(client.name())
            .await
            .into_iter()
            .map(ClientName::into_string)
            .collect();
        match serde_json::to_string(&UserListMessage::new(others)) {
            Ok(user_list) => match client.try_push(user_list.into()) {
                Ok(()) => tracing::info!(
                    "User list sent to client '{}' in room '{}'",
                    client.name(),
                    room.name()
                ),
                Err(e) => tracing::warn!("Failed to queue user list: {}", e),
            },
            Err(e) => tracing::error!("Failed to encode user list: {}", e),
        }

        // 4. new-user を他のメンバーにブロードキャスト
        let report = room.broadcast(&new_user, Some(client.name())).await;
        tracing::info!(
            "New user '{}' broadcasted in room '{}' ({} delivered, {} dropped)",
            client.name(),
            room.name(),
            report.delivered,
            report.dropped
        );

        Ok(room)
    }
}
