//! Room registry trait.
//!
//! The registry is the only place rooms are created. Implementations keep the
//! room map behind their own lock and never hand it out directly.

use std::sync::Arc;

use async_trait::async_trait;

use super::{room::Room, value_object::RoomName};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRegistry: Send + Sync {
    /// Look up `name`, creating an empty room if absent.
    ///
    /// Atomic with respect to concurrent callers: at most one [`Room`] ever
    /// exists per name.
    async fn get_or_create_room(&self, name: RoomName) -> Arc<Room>;

    /// Look up `name` without creating it.
    async fn find_room(&self, name: &RoomName) -> Option<Arc<Room>>;

    /// All rooms, sorted by name. Empty rooms are included.
    async fn list_rooms(&self) -> Vec<Arc<Room>>;
}
