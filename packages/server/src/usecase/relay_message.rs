//! UseCase: メッセージ中継処理
//!
//! 受信したメッセージを分類し、宛先指定の転送またはルームへのブロードキャストを行う。
//! 転送・ブロードキャストともに受信した生のテキストをそのまま送る（再エンコードしない）。

use clap::ValueEnum;

use crate::{
    domain::{BroadcastReport, ClientName, Room, RoutingError},
    infrastructure::dto::websocket::InboundEnvelope,
};

/// Message types forwarded to a single named recipient.
const TARGETED_TYPES: [&str; 3] = ["offer", "answer", "candidate"];
const LEAVE_TYPE: &str = "leave";

/// What to do with messages that are neither targeted nor `leave`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum UnroutedPolicy {
    /// Relay to everyone else in the room.
    #[default]
    Broadcast,
    /// Drop the message.
    Ignore,
}

/// Routing decision for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Forward(ClientName),
    Leave,
    Unrouted,
}

impl Route {
    pub fn classify(envelope: &InboundEnvelope) -> Self {
        let kind = envelope.kind.as_deref();

        if let (Some(kind), Some(target)) = (kind, &envelope.target)
            && TARGETED_TYPES.contains(&kind)
            && let Ok(target) = ClientName::new(target.clone())
        {
            return Self::Forward(target);
        }

        if kind == Some(LEAVE_TYPE) {
            return Self::Leave;
        }

        Self::Unrouted
    }
}

/// Result of relaying one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Queued for the target.
    Forwarded,
    /// Target not in the room; discarded.
    TargetNotFound,
    /// Target's queue was full or closed; discarded.
    Dropped,
    Broadcast(BroadcastReport),
    /// Unrouted message discarded by [`UnroutedPolicy::Ignore`].
    Ignored,
    /// Not a JSON object; discarded.
    Discarded,
    /// The sender asked to leave; the read loop should stop.
    Leave,
}

/// メッセージ中継のユースケース
pub struct RelayMessageUseCase {
    unrouted: UnroutedPolicy,
}

impl RelayMessageUseCase {
    pub fn new(unrouted: UnroutedPolicy) -> Self {
        Self { unrouted }
    }

    /// `raw` を `sender` の所属する `room` 内で中継する
    pub async fn execute(&self, room: &Room, sender: &ClientName, raw: &str) -> RelayOutcome {
        let envelope = match InboundEnvelope::parse(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("Invalid message format from client '{}': {}", sender, e);
                return RelayOutcome::Discarded;
            }
        };
        let kind = envelope.kind.as_deref().unwrap_or("");

        match Route::classify(&envelope) {
            Route::Forward(target) => match room.forward(&target, raw).await {
                Ok(()) => {
                    tracing::info!(
                        "Message of type '{}' from '{}' forwarded to '{}' in room '{}'",
                        kind,
                        sender,
                        target,
                        room.name()
                    );
                    RelayOutcome::Forwarded
                }
                Err(RoutingError::TargetNotFound(_)) => {
                    tracing::info!(
                        "Target client '{}' not found in room '{}'",
                        target,
                        room.name()
                    );
                    RelayOutcome::TargetNotFound
                }
                Err(RoutingError::Push(e)) => {
                    tracing::warn!("{}. Message dropped.", e);
                    RelayOutcome::Dropped
                }
            },
            Route::Leave => {
                tracing::info!("Client '{}' asked to leave room '{}'", sender, room.name());
                RelayOutcome::Leave
            }
            Route::Unrouted => match self.unrouted {
                UnroutedPolicy::Broadcast => {
                    tracing::info!(
                        "Broadcasting message of type '{}' from '{}' in room '{}'",
                        kind,
                        sender,
                        room.name()
                    );
                    RelayOutcome::Broadcast(room.broadcast(raw, Some(sender)).await)
                }
                UnroutedPolicy::Ignore => {
                    tracing::debug!(
                        "Ignoring unrouted message of type '{}' from '{}'",
                        kind,
                        sender
                    );
                    RelayOutcome::Ignored
                }
            },
        }
    }
}
