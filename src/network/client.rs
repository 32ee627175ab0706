//! Client Sync Session
//!
//! Per-client connection wrapper for online mode. Keeps a local mirror of
//! the room's canonical state, surfaces connection status and peer count,
//! and turns [`GameAction`]s into outbound frames. The mirror is
//! non-authoritative: it only ever changes when the relay broadcasts, so a
//! local dispatch becomes visible one round trip later. The transport
//! auto-reconnects; the relay resends full state on connect, so a resync
//! request exists but is rarely needed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::game::action::GameAction;
use crate::game::state::GameState;
use crate::network::protocol::{ClientMessage, ServerMessage};
use crate::session::Dispatcher;

/// Connection status surfaced to the UI. The only failure state a user
/// ever sees.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Transport connecting (or reconnecting).
    Connecting,
    /// Transport open.
    Connected,
    /// Transport closed; a reconnect attempt will follow.
    Disconnected,
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relay host, e.g. `localhost:1999`.
    pub host: String,
    /// Delay between reconnect attempts.
    pub reconnect_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost:1999".to_string(),
            reconnect_delay: Duration::from_secs(2),
        }
    }
}

struct Shared {
    state: Mutex<GameState>,
    status: Mutex<ConnectionStatus>,
    peer_count: AtomicUsize,
}

impl Shared {
    fn set_status(&self, status: ConnectionStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }
}

/// A live sync session against one room.
pub struct SyncSession {
    shared: Arc<Shared>,
    out_tx: mpsc::UnboundedSender<ClientMessage>,
    task: JoinHandle<()>,
}

impl SyncSession {
    /// Connect to a room. Returns immediately; the connection is
    /// established (and re-established) by a background task.
    pub fn connect(config: ClientConfig, room: &str) -> Self {
        let room = room.trim().to_uppercase();
        let url = format!("ws://{}/?room={}", config.host, room);

        let shared = Arc::new(Shared {
            state: Mutex::new(GameState::new()),
            status: Mutex::new(ConnectionStatus::Connecting),
            peer_count: AtomicUsize::new(0),
        });
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        let task_shared = shared.clone();
        let task = tokio::spawn(async move {
            run_session(url, config.reconnect_delay, task_shared, out_rx).await;
        });

        Self { shared, out_tx, task }
    }

    /// Propose an action. Fire-and-forget: the visible update arrives with
    /// the relay's next broadcast.
    pub fn dispatch(&self, action: GameAction) {
        if self.out_tx.send(ClientMessage::Action { action }).is_err() {
            debug!("dispatch after session closed");
        }
    }

    /// Explicitly ask the relay for the current full state.
    pub fn request_state(&self) {
        let _ = self.out_tx.send(ClientMessage::RequestState);
    }

    /// Snapshot of the local state mirror.
    pub fn state(&self) -> GameState {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        *self
            .shared
            .status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Connections currently in the room, as last broadcast by the relay.
    pub fn peer_count(&self) -> usize {
        self.shared.peer_count.load(Ordering::Acquire)
    }
}

impl Dispatcher for SyncSession {
    fn dispatch(&mut self, action: GameAction) {
        SyncSession::dispatch(self, action);
    }

    fn current_state(&self) -> GameState {
        self.state()
    }
}

impl Drop for SyncSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

enum PumpEnd {
    /// The session handle was dropped; stop for good.
    SenderClosed,
    /// The transport failed or closed; reconnect.
    Transport,
}

async fn run_session(
    url: String,
    reconnect_delay: Duration,
    shared: Arc<Shared>,
    mut out_rx: mpsc::UnboundedReceiver<ClientMessage>,
) {
    loop {
        shared.set_status(ConnectionStatus::Connecting);
        match connect_async(url.as_str()).await {
            Ok((ws, _)) => {
                shared.set_status(ConnectionStatus::Connected);
                let end = pump(ws, &shared, &mut out_rx).await;
                shared.set_status(ConnectionStatus::Disconnected);
                if matches!(end, PumpEnd::SenderClosed) {
                    return;
                }
            }
            Err(e) => {
                debug!("connect to {} failed: {}", url, e);
                shared.set_status(ConnectionStatus::Disconnected);
            }
        }
        tokio::time::sleep(reconnect_delay).await;
    }
}

/// Shuttle frames until the transport drops or the handle goes away.
///
/// Incoming `state` payloads replace the mirror wholesale, never patch
/// it; the schema defaulting that `migrate` performs happens as part of
/// deserializing the frame, so state from an older relay loads cleanly.
async fn pump(
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    shared: &Shared,
    out_rx: &mut mpsc::UnboundedReceiver<ClientMessage>,
) -> PumpEnd {
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            outbound = out_rx.recv() => {
                match outbound {
                    Some(msg) => {
                        let text = match msg.to_json() {
                            Ok(text) => text,
                            Err(e) => {
                                warn!("failed to serialize frame: {}", e);
                                continue;
                            }
                        };
                        if sink.send(Message::Text(text)).await.is_err() {
                            return PumpEnd::Transport;
                        }
                    }
                    None => return PumpEnd::SenderClosed,
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match ServerMessage::from_json(&text) {
                            Ok(ServerMessage::State { state }) => {
                                *shared.state.lock().unwrap_or_else(PoisonError::into_inner) =
                                    state;
                            }
                            Ok(ServerMessage::Peers { count }) => {
                                shared.peer_count.store(count, Ordering::Release);
                            }
                            Err(e) => {
                                debug!("dropping malformed frame: {}", e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return PumpEnd::Transport,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("websocket error: {}", e);
                        return PumpEnd::Transport;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::relay::{RelayConfig, RelayServer};

    async fn eventually(mut check: impl FnMut() -> bool) -> bool {
        for _ in 0..300 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    async fn start_relay() -> (Arc<RelayServer>, std::net::SocketAddr) {
        let config = RelayConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        };
        let server = Arc::new(RelayServer::new(config));
        let runner = server.clone();
        tokio::spawn(async move {
            let _ = runner.run().await;
        });
        let addr = loop {
            if let Some(addr) = server.local_addr().await {
                break addr;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        };
        (server, addr)
    }

    #[tokio::test]
    async fn test_session_syncs_through_relay() {
        let (_server, addr) = start_relay().await;
        let config = ClientConfig {
            host: addr.to_string(),
            reconnect_delay: Duration::from_millis(100),
        };

        let alice = SyncSession::connect(config.clone(), "WXYZ");
        assert!(eventually(|| alice.status() == ConnectionStatus::Connected).await);
        assert!(eventually(|| alice.peer_count() == 1).await);

        // Dispatch becomes visible only via the relay's broadcast.
        alice.dispatch(GameAction::AddPlayer { name: "Alice".into() });
        assert!(eventually(|| alice.state().players.len() == 1).await);

        // A second device joining the same room receives the full state
        // on connect, and both see the new peer count.
        let bob = SyncSession::connect(config, "wxyz");
        assert!(eventually(|| bob.state().players.len() == 1).await);
        assert!(eventually(|| alice.peer_count() == 2 && bob.peer_count() == 2).await);

        // Actions from either device reach both mirrors.
        bob.dispatch(GameAction::AddPlayer { name: "Bob".into() });
        assert!(eventually(|| alice.state().players.len() == 2).await);
        assert!(eventually(|| bob.state().players.len() == 2).await);

        // Explicit resync returns the same canonical state.
        let before = bob.state();
        bob.request_state();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(bob.state(), before);
    }

    #[tokio::test]
    async fn test_disconnect_surfaces_and_reconnects() {
        let (server, addr) = start_relay().await;
        let config = ClientConfig {
            host: addr.to_string(),
            reconnect_delay: Duration::from_millis(50),
        };

        let session = SyncSession::connect(config, "RECO");
        assert!(eventually(|| session.status() == ConnectionStatus::Connected).await);

        server.shutdown();
        assert!(eventually(|| session.status() != ConnectionStatus::Connected).await);
    }
}
