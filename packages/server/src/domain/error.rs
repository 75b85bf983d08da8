//! Domain error types.

use thiserror::Error;

/// Validation errors raised when constructing value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("client name must not be empty")]
    EmptyClientName,

    #[error("room name must not be empty")]
    EmptyRoomName,
}

/// Errors returned by a non-blocking enqueue onto a client's outbound queue.
///
/// Callers treat both variants as "dropped"; neither is surfaced to peers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("outbound queue for '{0}' is full")]
    QueueFull(String),

    #[error("outbound queue for '{0}' is closed")]
    Closed(String),
}

/// Errors from forwarding a message to one named member of a room.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("target '{0}' is not a member of the room")]
    TargetNotFound(String),

    #[error(transparent)]
    Push(#[from] MessagePushError),
}
