//! UseCase error types.

use thiserror::Error;

use crate::domain::ValueObjectError;

/// Reasons a connection fails the join handshake.
///
/// Every variant ends with the connection being closed unadmitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("join message is not valid JSON: {0}")]
    Malformed(String),

    #[error("expected a 'join' message, got '{0}'")]
    UnexpectedType(String),

    #[error("invalid join field: {0}")]
    InvalidField(#[from] ValueObjectError),

    #[error("binary join message is not valid UTF-8")]
    NotUtf8,

    #[error("connection closed before a join message arrived")]
    ConnectionClosed,

    #[error("transport error during join: {0}")]
    Transport(String),

    #[error("failed to encode presence message: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("room not found")]
    RoomNotFound,
}
