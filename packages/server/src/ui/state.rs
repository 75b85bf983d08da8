//! Shared application state.

use std::{num::NonZeroUsize, sync::Arc};

use crate::usecase::{
    GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase, LeaveRoomUseCase, RelayMessageUseCase,
};

/// Shared application state
pub struct AppState {
    /// JoinRoomUseCase（join ハンドシェイクのユースケース）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// RelayMessageUseCase（メッセージ中継のユースケース）
    pub relay_message_usecase: Arc<RelayMessageUseCase>,
    /// LeaveRoomUseCase（退出のユースケース）
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// Capacity of each client's outbound queue
    pub queue_capacity: NonZeroUsize,
}
