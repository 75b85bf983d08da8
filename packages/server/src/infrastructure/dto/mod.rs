//! Data Transfer Objects (DTOs) for the signaling relay.
//!
//! DTOs are organized by protocol:
//! - `websocket`: signaling messages exchanged over the WebSocket
//! - `http`: inspection API response bodies

pub mod conversion;
pub mod http;
pub mod websocket;
