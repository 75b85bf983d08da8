//! InMemory Room Registry 実装
//!
//! ドメイン層が定義する RoomRegistry trait の具体的な実装。
//! HashMap をインメモリのルーム表として使用します。
//!
//! 空になったルームも削除しません（再起動まで保持されます）。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Room, RoomName, RoomRegistry, Timestamp};
use tsunagi_shared::time::now_millis;

/// インメモリ Room Registry 実装
pub struct InMemoryRoomRegistry {
    /// ルーム名 → Room
    rooms: Mutex<HashMap<RoomName, Arc<Room>>>,
}

impl InMemoryRoomRegistry {
    /// 空の InMemoryRoomRegistry を作成
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomRegistry for InMemoryRoomRegistry {
    async fn get_or_create_room(&self, name: RoomName) -> Arc<Room> {
        let mut rooms = self.rooms.lock().await;

        if let Some(room) = rooms.get(&name) {
            tracing::debug!("Room '{}' found. Reusing existing room.", name);
            return room.clone();
        }

        let room = Arc::new(Room::new(name.clone(), Timestamp::new(now_millis())));
        rooms.insert(name.clone(), room.clone());
        tracing::info!("Room '{}' created.", name);
        room
    }

    async fn find_room(&self, name: &RoomName) -> Option<Arc<Room>> {
        let rooms = self.rooms.lock().await;
        rooms.get(name).cloned()
    }

    async fn list_rooms(&self) -> Vec<Arc<Room>> {
        let rooms = self.rooms.lock().await;
        let mut list: Vec<Arc<Room>> = rooms.values().cloned().collect();
        list.sort_by(|a, b| a.name().cmp(b.name()));
        list
    }
}
