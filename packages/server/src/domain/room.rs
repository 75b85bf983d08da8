//! Room entity: a named set of clients guarded by a per-room lock.
//!
//! The lock is held only around map access and non-blocking enqueues, never
//! across a socket write. Delivery to the socket happens in each client's
//! drain loop.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use super::{
    client::ClientHandle,
    error::RoutingError,
    value_object::{ClientName, ConnectionId, RoomName, Timestamp},
};

/// Per-broadcast delivery counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// Point-in-time view of one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSnapshot {
    pub name: ClientName,
    pub joined_at: Timestamp,
}

/// Point-in-time view of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub name: RoomName,
    pub created_at: Timestamp,
    /// Sorted by name.
    pub members: Vec<MemberSnapshot>,
}

#[derive(Debug)]
pub struct Room {
    name: RoomName,
    created_at: Timestamp,
    members: Mutex<HashMap<ClientName, ClientHandle>>,
}

impl Room {
    pub fn new(name: RoomName, created_at: Timestamp) -> Self {
        Self {
            name,
            created_at,
            members: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &RoomName {
        &self.name
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Insert `client`, evicting any member already holding its name.
    ///
    /// The evicted member's connection is closed before the new one is
    /// inserted, all under the room lock. Returns the evicted handle.
    pub async fn admit(&self, client: ClientHandle) -> Option<ClientHandle> {
        let mut members = self.members.lock().await;
        let evicted = members.remove(client.name());
        if let Some(previous) = &evicted {
            previous.close();
            tracing::info!(
                "Client '{}' ({}) evicted from room '{}' by a rejoin with the same name",
                previous.name(),
                previous.id(),
                self.name
            );
        }
        tracing::info!(
            "Client '{}' ({}) added to room '{}'",
            client.name(),
            client.id(),
            self.name
        );
        members.insert(client.name().clone(), client);
        evicted
    }

    /// Enqueue `message` to every member except `exclude`.
    ///
    /// Full queues drop the message for that member only.
    pub async fn broadcast(&self, message: &str, exclude: Option<&ClientName>) -> BroadcastReport {
        let members = self.members.lock().await;
        broadcast_locked(&self.name, &members, message, exclude)
    }

    /// Remove the member `name` if it is still the connection `id`, then
    /// broadcast `notice` (when given) to everyone left.
    ///
    /// Returns `false` without broadcasting when the entry is absent or now
    /// belongs to a newer connection.
    pub async fn remove(&self, name: &ClientName, id: ConnectionId, notice: Option<&str>) -> bool {
        let mut members = self.members.lock().await;
        match members.get(name) {
            Some(current) if current.id() == id => {}
            Some(_) => {
                tracing::debug!(
                    "Client '{}' ({}) already replaced in room '{}'; nothing to remove",
                    name,
                    id,
                    self.name
                );
                return false;
            }
            None => return false,
        }
        members.remove(name);
        tracing::info!("Client '{}' removed from room '{}'", name, self.name);

        if let Some(notice) = notice {
            broadcast_locked(&self.name, &members, notice, None);
        }
        true
    }

    /// Enqueue `message` to the single member `target`.
    pub async fn forward(&self, target: &ClientName, message: &str) -> Result<(), RoutingError> {
        let members = self.members.lock().await;
        let client = members
            .get(target)
            .ok_or_else(|| RoutingError::TargetNotFound(target.to_string()))?;
        client.try_push(Arc::from(message))?;
        Ok(())
    }

    /// Names of all members except `excluding`, sorted.
    pub async fn list_other_names(&self, excluding: &ClientName) -> Vec<ClientName> {
        let members = self.members.lock().await;
        let mut names: Vec<ClientName> = members
            .keys()
            .filter(|name| *name != excluding)
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub async fn snapshot(&self) -> RoomSnapshot {
        let members = self.members.lock().await;
        let mut snapshot: Vec<MemberSnapshot> = members
            .values()
            .map(|client| MemberSnapshot {
                name: client.name().clone(),
                joined_at: client.joined_at(),
            })
            .collect();
        snapshot.sort_by(|a, b| a.name.cmp(&b.name));

        RoomSnapshot {
            name: self.name.clone(),
            created_at: self.created_at,
            members: snapshot,
        }
    }
}

/// Every recipient's queue shares the single buffer built here.
fn broadcast_locked(
    room_name: &RoomName,
    members: &HashMap<ClientName, ClientHandle>,
    message: &str,
    exclude: Option<&ClientName>,
) -> BroadcastReport {
    let message: Arc<str> = Arc::from(message);
    let mut report = BroadcastReport::default();
    for (name, client) in members.iter() {
        if Some(name) == exclude {
            continue;
        }
        match client.try_push(message.clone()) {
            Ok(()) => {
                report.delivered += 1;
                tracing::debug!("Message queued for '{}' in room '{}'", name, room_name);
            }
            Err(e) => {
                report.dropped += 1;
                tracing::warn!("{} in room '{}'. Message dropped.", e, room_name);
            }
        }
    }
    report
}

#[cfg(test)]
impl Room {
    pub(crate) async fn contains(&self, name: &ClientName) -> bool {
        self.members.lock().await.contains_key(name)
    }

    pub(crate) async fn member_count(&self) -> usize {
        self.members.lock().await.len()
    }
}
