//! UseCase: ルーム詳細取得

use std::sync::Arc;

use crate::domain::{RoomName, RoomRegistry, RoomSnapshot};

use super::error::GetRoomDetailError;

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    registry: Arc<dyn RoomRegistry>,
}

impl GetRoomDetailUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Snapshot of the room called `name`. Never creates the room.
    pub async fn execute(&self, name: String) -> Result<RoomSnapshot, GetRoomDetailError> {
        let name = RoomName::new(name).map_err(|_| GetRoomDetailError::RoomNotFound)?;
        let room = self
            .registry
            .find_room(&name)
            .await
            .ok_or(GetRoomDetailError::RoomNotFound)?;
        Ok(room.snapshot().await)
    }
}
