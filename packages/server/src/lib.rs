//! WebRTC signaling relay.
//!
//! Clients connect over WebSocket, join a named room with a `join` message,
//! and then exchange presence broadcasts and point-to-point negotiation
//! messages (`offer`, `answer`, `candidate`) addressed by name.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
