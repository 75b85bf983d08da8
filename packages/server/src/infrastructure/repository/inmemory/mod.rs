//! In-memory registry; state is lost on restart.

pub mod room;

pub use room::InMemoryRoomRegistry;
