//! Domain layer: rooms, their members and the registry interface.

pub mod client;
pub mod error;
pub mod repository;
pub mod room;
pub mod value_object;

pub use client::{ClientHandle, ConnectionCloser, PusherChannel};
pub use error::{MessagePushError, RoutingError, ValueObjectError};
pub use repository::RoomRegistry;
#[cfg(test)]
pub use repository::MockRoomRegistry;
pub use room::{BroadcastReport, MemberSnapshot, Room, RoomSnapshot};
pub use value_object::{ClientName, ConnectionId, RoomName, Timestamp};
