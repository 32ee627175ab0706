//! Rooms
//!
//! One room = one canonical [`GameState`] plus its connection set. All
//! message handling for a room happens under the room's lock, so actions
//! are applied one at a time in arrival order: whichever action the queue
//! delivers first wins, and a broadcast always reflects a fully applied
//! action. Rooms are fully isolated from each other.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info};

use crate::game::reduce::reduce;
use crate::game::state::GameState;
use crate::network::protocol::{ClientMessage, ServerMessage};

/// Per-process connection identifier.
pub type ConnId = u64;

/// A room: the canonical state and the connections watching it.
pub struct Room {
    state: GameState,
    conns: BTreeMap<ConnId, mpsc::UnboundedSender<ServerMessage>>,
    empty_since: Option<Instant>,
}

impl Room {
    /// Create an empty room with the canonical empty state.
    pub fn new() -> Self {
        Self {
            state: GameState::new(),
            conns: BTreeMap::new(),
            empty_since: Some(Instant::now()),
        }
    }

    /// Register a connection: it receives the full current state, then the
    /// whole room learns the new peer count.
    pub fn join(&mut self, id: ConnId, tx: mpsc::UnboundedSender<ServerMessage>) {
        let _ = tx.send(ServerMessage::State { state: self.state.clone() });
        self.conns.insert(id, tx);
        self.empty_since = None;
        self.broadcast_peers();
    }

    /// Drop a connection and tell the rest of the room.
    pub fn leave(&mut self, id: ConnId) {
        self.conns.remove(&id);
        if self.conns.is_empty() {
            self.empty_since = Some(Instant::now());
        }
        self.broadcast_peers();
    }

    /// Handle one message from one connection.
    ///
    /// An action replaces the canonical state and broadcasts it to every
    /// connection, sender included. A state request is answered to the
    /// requester only.
    pub fn handle(&mut self, from: ConnId, msg: ClientMessage, now: i64) {
        match msg {
            ClientMessage::Action { action } => {
                self.state = reduce(&self.state, &action, now);
                self.broadcast(ServerMessage::State { state: self.state.clone() });
            }
            ClientMessage::RequestState => {
                if let Some(tx) = self.conns.get(&from) {
                    let _ = tx.send(ServerMessage::State { state: self.state.clone() });
                }
            }
        }
    }

    /// Current connection count.
    pub fn peer_count(&self) -> usize {
        self.conns.len()
    }

    /// Copy of the canonical state.
    pub fn state(&self) -> GameState {
        self.state.clone()
    }

    /// How long the room has been without connections, if it is.
    pub fn idle_for(&self) -> Option<Duration> {
        if self.conns.is_empty() {
            self.empty_since.map(|since| since.elapsed())
        } else {
            None
        }
    }

    fn broadcast(&self, msg: ServerMessage) {
        for tx in self.conns.values() {
            let _ = tx.send(msg.clone());
        }
    }

    fn broadcast_peers(&self) {
        self.broadcast(ServerMessage::Peers { count: self.conns.len() });
    }
}

impl Default for Room {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Registry mapping room codes to live rooms.
///
/// Rooms are created implicitly on first join and removed by the sweep
/// once they have sat empty past the configured idle timeout.
pub struct RoomRegistry {
    rooms: RwLock<BTreeMap<String, Arc<Mutex<Room>>>>,
}

impl RoomRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { rooms: RwLock::new(BTreeMap::new()) }
    }

    /// Get the room for a code, creating it if this is the first join.
    pub async fn open(&self, code: &str) -> Arc<Mutex<Room>> {
        let mut rooms = self.rooms.write().await;
        if let Some(room) = rooms.get(code) {
            return room.clone();
        }
        info!(room = code, "creating room");
        let room = Arc::new(Mutex::new(Room::new()));
        rooms.insert(code.to_string(), room.clone());
        room
    }

    /// Get an existing room, if any.
    pub async fn get(&self, code: &str) -> Option<Arc<Mutex<Room>>> {
        self.rooms.read().await.get(code).cloned()
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Remove rooms that have been empty longer than `idle_timeout`.
    /// Returns how many were evicted.
    pub async fn sweep_idle(&self, idle_timeout: Duration) -> usize {
        let mut rooms = self.rooms.write().await;
        let mut stale = Vec::new();
        for (code, room) in rooms.iter() {
            let room = room.lock().await;
            if matches!(room.idle_for(), Some(idle) if idle > idle_timeout) {
                stale.push(code.clone());
            }
        }
        for code in &stale {
            rooms.remove(code);
            debug!(room = code.as_str(), "evicted idle room");
        }
        stale.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::action::GameAction;

    const NOW: i64 = 1_700_000_000_000;

    fn conn() -> (
        mpsc::UnboundedSender<ServerMessage>,
        mpsc::UnboundedReceiver<ServerMessage>,
    ) {
        mpsc::unbounded_channel()
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[tokio::test]
    async fn test_join_sends_state_then_peer_count() {
        let mut room = Room::new();
        let (tx, mut rx) = conn();
        room.join(1, tx);

        let msgs = drain(&mut rx);
        assert_eq!(msgs.len(), 2);
        assert!(matches!(&msgs[0], ServerMessage::State { state } if *state == GameState::new()));
        assert!(matches!(msgs[1], ServerMessage::Peers { count: 1 }));
    }

    #[tokio::test]
    async fn test_action_broadcasts_identical_state_to_all() {
        let mut room = Room::new();
        let (tx1, mut rx1) = conn();
        let (tx2, mut rx2) = conn();
        room.join(1, tx1);
        room.join(2, tx2);
        drain(&mut rx1);
        drain(&mut rx2);

        room.handle(
            1,
            ClientMessage::Action { action: GameAction::AddPlayer { name: "A".into() } },
            NOW,
        );

        let to_sender = drain(&mut rx1);
        let to_peer = drain(&mut rx2);
        assert_eq!(to_sender, to_peer);
        assert_eq!(to_sender.len(), 1);
        match &to_sender[0] {
            ServerMessage::State { state } => {
                assert_eq!(state.players.len(), 1);
                assert_eq!(state.players[0].name, "A");
            }
            other => panic!("expected state broadcast, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_request_state_answers_requester_only() {
        let mut room = Room::new();
        let (tx1, mut rx1) = conn();
        let (tx2, mut rx2) = conn();
        room.join(1, tx1);
        room.join(2, tx2);
        room.handle(
            1,
            ClientMessage::Action { action: GameAction::AddPlayer { name: "A".into() } },
            NOW,
        );
        drain(&mut rx1);
        drain(&mut rx2);

        room.handle(2, ClientMessage::RequestState, NOW);

        assert!(drain(&mut rx1).is_empty());
        let replies = drain(&mut rx2);
        assert_eq!(replies.len(), 1);
        assert!(
            matches!(&replies[0], ServerMessage::State { state } if state.players.len() == 1)
        );
    }

    #[tokio::test]
    async fn test_leave_broadcasts_updated_peer_count() {
        let mut room = Room::new();
        let (tx1, mut rx1) = conn();
        let (tx2, mut rx2) = conn();
        room.join(1, tx1);
        room.join(2, tx2);
        drain(&mut rx1);
        drain(&mut rx2);

        room.leave(2);
        drop(rx2);

        let msgs = drain(&mut rx1);
        assert_eq!(msgs.len(), 1);
        assert!(matches!(msgs[0], ServerMessage::Peers { count: 1 }));
    }

    #[tokio::test]
    async fn test_registry_reuses_room_per_code() {
        let registry = RoomRegistry::new();
        let first = registry.open("ABCD").await;
        let second = registry.open("ABCD").await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.room_count().await, 1);

        assert!(registry.get("ZZZZ").await.is_none());
    }

    #[tokio::test]
    async fn test_rooms_are_isolated() {
        let registry = RoomRegistry::new();
        let (tx1, mut rx1) = conn();
        let (tx2, mut rx2) = conn();

        registry.open("AAAA").await.lock().await.join(1, tx1);
        registry.open("BBBB").await.lock().await.join(2, tx2);
        drain(&mut rx1);
        drain(&mut rx2);

        registry.open("AAAA").await.lock().await.handle(
            1,
            ClientMessage::Action { action: GameAction::AddPlayer { name: "A".into() } },
            NOW,
        );

        assert_eq!(drain(&mut rx1).len(), 1);
        assert!(drain(&mut rx2).is_empty());
    }

    #[tokio::test]
    async fn test_sweep_evicts_only_idle_rooms() {
        let registry = RoomRegistry::new();
        let (tx, _rx) = conn();

        registry.open("LIVE").await.lock().await.join(1, tx);
        {
            // Joined then left: empty and eligible once the timeout passes.
            let (tx2, _rx2) = conn();
            let room = registry.open("DEAD").await;
            let mut room = room.lock().await;
            room.join(2, tx2);
            room.leave(2);
        }

        let evicted = registry.sweep_idle(Duration::from_secs(0)).await;
        assert_eq!(evicted, 1);
        assert!(registry.get("DEAD").await.is_none());
        assert!(registry.get("LIVE").await.is_some());
    }
}
