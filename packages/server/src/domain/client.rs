//! Client handle stored in a room's member map.

use std::sync::Arc;

use tokio::sync::{mpsc, mpsc::error::TrySendError, watch};

use super::{
    error::MessagePushError,
    value_object::{ClientName, ConnectionId, Timestamp},
};

/// Sending half of a client's bounded outbound queue.
///
/// Items are shared buffers so one broadcast serializes once for all
/// recipients.
pub type PusherChannel = mpsc::Sender<Arc<str>>;

/// Signal used to force a client's connection closed.
///
/// Fired by the room when a same-name rejoin evicts the client, and by the
/// drain loop when a write fails. Both the read loop and the drain loop wait
/// on it, and the signal stays set once fired.
#[derive(Debug, Clone)]
pub struct ConnectionCloser {
    state: Arc<watch::Sender<bool>>,
}

impl ConnectionCloser {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Request the connection be closed. Idempotent.
    pub fn close(&self) {
        self.state.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once [`close`](Self::close) has been called, including when
    /// it was called before this future was created.
    pub async fn closed(&self) {
        let mut rx = self.state.subscribe();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            // The sender lives in `self`, so this only fails if it is gone.
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for ConnectionCloser {
    fn default() -> Self {
        Self::new()
    }
}

/// One admitted member of a room.
///
/// Cloning is cheap: the queue sender and the close signal are shared.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: ConnectionId,
    name: ClientName,
    joined_at: Timestamp,
    outbound: PusherChannel,
    closer: ConnectionCloser,
}

impl ClientHandle {
    pub fn new(
        name: ClientName,
        outbound: PusherChannel,
        closer: ConnectionCloser,
        joined_at: Timestamp,
    ) -> Self {
        Self {
            id: ConnectionId::generate(),
            name,
            joined_at,
            outbound,
            closer,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn name(&self) -> &ClientName {
        &self.name
    }

    pub fn joined_at(&self) -> Timestamp {
        self.joined_at
    }

    /// Enqueue a message without waiting.
    ///
    /// Fails with [`MessagePushError::QueueFull`] when the consumer has fallen
    /// behind; the message is not retried.
    pub fn try_push(&self, message: Arc<str>) -> Result<(), MessagePushError> {
        self.outbound
            .try_send(message)
            .map_err(|e| match e {
                TrySendError::Full(_) => MessagePushError::QueueFull(self.name.to_string()),
                TrySendError::Closed(_) => MessagePushError::Closed(self.name.to_string()),
            })
    }

    /// Force the underlying connection closed.
    pub fn close(&self) {
        self.closer.close();
    }
}
