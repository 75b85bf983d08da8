//! UseCase layer: join handshake, message routing, departure and inspection.

pub mod error;
pub mod get_room_detail;
pub mod get_rooms;
pub mod join_room;
pub mod leave_room;
pub mod relay_message;

pub use error::{GetRoomDetailError, JoinError};
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_room::{JoinRequest, JoinRoomUseCase};
pub use leave_room::LeaveRoomUseCase;
pub use relay_message::{RelayMessageUseCase, RelayOutcome, Route, UnroutedPolicy};
