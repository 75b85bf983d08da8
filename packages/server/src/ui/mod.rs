//! WebSocket signaling server: router, handlers and runner.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::{Server, ServerError};
