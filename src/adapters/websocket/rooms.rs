//! Session registry - live connections and the rooms they joined.
//!
//! ```text
//! Room: user:alice               Room: conversation:42
//! ├── conn-a (alice, laptop)     ├── conn-a
//! └── conn-b (alice, phone)      └── conn-c (bob)
//! ```
//!
//! Each connection owns a bounded outbound queue drained by its socket
//! task. Room emits never wait on a socket: when a queue is full the frame
//! is dropped for that connection only. Direct replies (acks, join and
//! leave results) go through [`SessionRegistry::deliver`], which waits for
//! queue space instead.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::domain::foundation::UserId;
use crate::domain::realtime::{RoomName, ServerEvent};
use crate::ports::{FanoutError, RealtimeFanout};

use super::messages::OutboundFrame;

/// Server-side identifier of one socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Connection {
    user: UserId,
    outbound: mpsc::Sender<OutboundFrame>,
    rooms: HashSet<RoomName>,
}

#[derive(Default)]
struct Registry {
    connections: HashMap<ConnectionId, Connection>,
    rooms: HashMap<RoomName, HashSet<ConnectionId>>,
}

impl Registry {
    fn join(&mut self, id: ConnectionId, room: RoomName) -> bool {
        let Some(connection) = self.connections.get_mut(&id) else {
            return false;
        };
        connection.rooms.insert(room.clone());
        self.rooms.entry(room).or_default().insert(id);
        true
    }

    fn leave(&mut self, id: ConnectionId, room: &RoomName) {
        if let Some(connection) = self.connections.get_mut(&id) {
            connection.rooms.remove(room);
        }
        if let Some(members) = self.rooms.get_mut(room) {
            members.remove(&id);
            if members.is_empty() {
                self.rooms.remove(room);
            }
        }
    }
}

/// Connection and room bookkeeping for the real-time gateway.
///
/// Uses a std `RwLock`: no lock is held across an `.await`, and emits
/// (reads) vastly outnumber joins and leaves (writes).
#[derive(Default)]
pub struct SessionRegistry {
    inner: RwLock<Registry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Adds an authenticated connection and joins it to its user room.
    pub fn register(&self, user: &UserId, outbound: mpsc::Sender<OutboundFrame>) -> ConnectionId {
        let id = ConnectionId::new();
        let mut registry = self.write();
        registry.connections.insert(
            id,
            Connection {
                user: user.clone(),
                outbound,
                rooms: HashSet::new(),
            },
        );
        registry.join(id, RoomName::user(user));
        tracing::debug!(connection_id = %id, user_id = %user, "connection registered");
        id
    }

    /// Returns false when the connection is unknown (already disconnected).
    pub fn join(&self, id: ConnectionId, room: RoomName) -> bool {
        self.write().join(id, room)
    }

    pub fn leave(&self, id: ConnectionId, room: &RoomName) {
        self.write().leave(id, room);
    }

    /// Drops the connection from every room. Returns its user, if it was
    /// still registered.
    pub fn disconnect(&self, id: ConnectionId) -> Option<UserId> {
        let mut registry = self.write();
        let connection = registry.connections.remove(&id)?;
        for room in &connection.rooms {
            if let Some(members) = registry.rooms.get_mut(room) {
                members.remove(&id);
                if members.is_empty() {
                    registry.rooms.remove(room);
                }
            }
        }
        tracing::debug!(connection_id = %id, user_id = %connection.user, "connection removed");
        Some(connection.user)
    }

    fn outbound_of(&self, id: ConnectionId) -> Option<mpsc::Sender<OutboundFrame>> {
        self.read().connections.get(&id).map(|c| c.outbound.clone())
    }

    /// Queues a reply for one connection, waiting for queue space. Returns
    /// false only when the connection is gone.
    pub async fn deliver(&self, id: ConnectionId, frame: OutboundFrame) -> bool {
        let Some(outbound) = self.outbound_of(id) else {
            return false;
        };
        match outbound.send(frame).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(connection_id = %id, event = e.0.name(), "reply to closed connection");
                false
            }
        }
    }

    /// Queues a frame for one connection, dropping it when the queue is full.
    pub fn send_to(&self, id: ConnectionId, frame: OutboundFrame) -> bool {
        let registry = self.read();
        match registry.connections.get(&id) {
            Some(connection) => offer(id, &connection.outbound, frame),
            None => false,
        }
    }

    /// Queues `event` for every connection in `room`. Returns how many
    /// queues accepted it.
    pub fn emit(&self, room: &RoomName, event: ServerEvent) -> usize {
        let registry = self.read();
        let Some(members) = registry.rooms.get(room) else {
            return 0;
        };
        let frame = OutboundFrame::Event(event);
        members
            .iter()
            .filter_map(|id| registry.connections.get(id).map(|c| (*id, c)))
            .filter(|(id, connection)| offer(*id, &connection.outbound, frame.clone()))
            .count()
    }

    pub fn connection_count(&self) -> usize {
        self.read().connections.len()
    }

    pub fn room_size(&self, room: &RoomName) -> usize {
        self.read().rooms.get(room).map_or(0, HashSet::len)
    }

    pub fn is_member(&self, id: ConnectionId, room: &RoomName) -> bool {
        self.read()
            .rooms
            .get(room)
            .is_some_and(|members| members.contains(&id))
    }

    pub fn user_of(&self, id: ConnectionId) -> Option<UserId> {
        self.read().connections.get(&id).map(|c| c.user.clone())
    }
}

fn offer(id: ConnectionId, outbound: &mpsc::Sender<OutboundFrame>, frame: OutboundFrame) -> bool {
    match outbound.try_send(frame) {
        Ok(()) => true,
        Err(TrySendError::Full(frame)) => {
            tracing::warn!(
                connection_id = %id,
                event = frame.name(),
                "outbound queue full, dropping frame"
            );
            false
        }
        Err(TrySendError::Closed(_)) => {
            tracing::debug!(connection_id = %id, "outbound queue closed");
            false
        }
    }
}

#[async_trait]
impl RealtimeFanout for SessionRegistry {
    async fn emit_to_room(
        &self,
        room: &RoomName,
        event: ServerEvent,
    ) -> Result<usize, FanoutError> {
        Ok(self.emit(room, event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ConversationId;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn count(n: u64) -> ServerEvent {
        ServerEvent::notification_count(n)
    }

    #[tokio::test]
    async fn register_joins_user_room() {
        let registry = SessionRegistry::new();
        let (tx, mut rx) = mpsc::channel(8);

        let id = registry.register(&user("alice"), tx);

        assert!(registry.is_member(id, &RoomName::user(&user("alice"))));
        assert_eq!(registry.emit(&RoomName::user(&user("alice")), count(1)), 1);
        assert_eq!(rx.recv().await, Some(OutboundFrame::Event(count(1))));
    }

    #[tokio::test]
    async fn every_connection_of_a_user_receives() {
        let registry = SessionRegistry::new();
        let (tx1, mut rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);
        registry.register(&user("alice"), tx1);
        registry.register(&user("alice"), tx2);

        let delivered = registry
            .emit_to_user(&user("alice"), count(3))
            .await
            .unwrap();

        assert_eq!(delivered, 2);
        assert!(rx1.recv().await.is_some());
        assert!(rx2.recv().await.is_some());
    }

    #[test]
    fn conversation_room_membership() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::channel(8);
        let id = registry.register(&user("bob"), tx);
        let room = RoomName::conversation(&ConversationId::new());

        assert!(registry.join(id, room.clone()));
        assert_eq!(registry.room_size(&room), 1);

        registry.leave(id, &room);
        assert_eq!(registry.room_size(&room), 0);
        assert!(!registry.is_member(id, &room));
    }

    #[test]
    fn disconnect_clears_every_room() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::channel(8);
        let id = registry.register(&user("bob"), tx);
        let room = RoomName::conversation(&ConversationId::new());
        registry.join(id, room.clone());

        assert_eq!(registry.disconnect(id), Some(user("bob")));

        assert_eq!(registry.connection_count(), 0);
        assert_eq!(registry.room_size(&room), 0);
        assert_eq!(registry.room_size(&RoomName::user(&user("bob"))), 0);
        assert!(!registry.join(id, room));
        assert_eq!(registry.disconnect(id), None);
    }

    #[test]
    fn full_queue_drops_without_blocking_others() {
        let registry = SessionRegistry::new();
        let (slow_tx, _slow_rx) = mpsc::channel(1);
        let (fast_tx, mut fast_rx) = mpsc::channel(8);
        let room = RoomName::user(&user("alice"));
        registry.register(&user("alice"), slow_tx);
        registry.register(&user("alice"), fast_tx);

        assert_eq!(registry.emit(&room, count(1)), 2);
        assert_eq!(registry.emit(&room, count(2)), 1);

        assert_eq!(fast_rx.try_recv().ok(), Some(OutboundFrame::Event(count(1))));
        assert_eq!(fast_rx.try_recv().ok(), Some(OutboundFrame::Event(count(2))));
    }

    #[test]
    fn empty_room_emits_to_nobody() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.emit(&RoomName::user(&user("ghost")), count(0)), 0);
    }

    #[tokio::test]
    async fn deliver_waits_for_queue_space() {
        let registry = SessionRegistry::new();
        let (tx, mut rx) = mpsc::channel(1);
        let id = registry.register(&user("alice"), tx);
        assert!(registry.send_to(id, OutboundFrame::Event(count(1))));
        assert!(!registry.send_to(id, OutboundFrame::Event(count(2))));

        let (delivered, first) = tokio::join!(
            registry.deliver(id, OutboundFrame::Event(count(3))),
            rx.recv()
        );

        assert!(delivered);
        assert_eq!(first, Some(OutboundFrame::Event(count(1))));
        assert_eq!(rx.recv().await, Some(OutboundFrame::Event(count(3))));
    }

    #[tokio::test]
    async fn deliver_to_closed_connection_fails() {
        let registry = SessionRegistry::new();
        let (tx, rx) = mpsc::channel(1);
        let id = registry.register(&user("alice"), tx);
        drop(rx);

        assert!(!registry.deliver(id, OutboundFrame::Event(count(1))).await);
        assert!(!registry.deliver(ConnectionId::new(), OutboundFrame::Event(count(1))).await);
    }

    #[test]
    fn send_to_unknown_connection_fails() {
        let registry = SessionRegistry::new();
        assert!(!registry.send_to(ConnectionId::new(), OutboundFrame::Event(count(0))));
    }
}
