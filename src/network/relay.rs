//! Room Relay Server
//!
//! Async WebSocket server holding the canonical state for every active
//! room. Each connection names its room with a `?room=CODE` query
//! parameter during the handshake; from then on the relay applies any
//! action it receives to that room's state and broadcasts the full result
//! to every connection in the room.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::interval;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{StatusCode, Uri};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::codes::normalize_room_code;
use crate::network::protocol::ClientMessage;
use crate::network::room::{ConnId, RoomRegistry};

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections across all rooms.
    pub max_connections: usize,
    /// How long a room may sit empty before eviction. `None` keeps empty
    /// rooms alive for the life of the process.
    pub room_idle_timeout: Option<Duration>,
    /// How often to sweep for idle rooms.
    pub sweep_interval: Duration,
    /// Server version string.
    pub version: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:1999".parse().unwrap(),
            max_connections: 1000,
            room_idle_timeout: Some(Duration::from_secs(300)),
            sweep_interval: Duration::from_secs(60),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Relay server errors.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Failed to bind the listener.
    #[error("failed to bind: {0}")]
    Bind(#[from] std::io::Error),
}

/// The relay server.
pub struct RelayServer {
    config: RelayConfig,
    rooms: Arc<RoomRegistry>,
    connections: Arc<AtomicUsize>,
    next_conn_id: AtomicU64,
    local_addr: RwLock<Option<SocketAddr>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl RelayServer {
    /// Create a new relay server.
    pub fn new(config: RelayConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            rooms: Arc::new(RoomRegistry::new()),
            connections: Arc::new(AtomicUsize::new(0)),
            next_conn_id: AtomicU64::new(1),
            local_addr: RwLock::new(None),
            shutdown_tx,
        }
    }

    /// Run the server until shutdown.
    pub async fn run(&self) -> Result<(), RelayError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        let local = listener.local_addr()?;
        *self.local_addr.write().await = Some(local);
        info!("relay v{} listening on {}", self.config.version, local);

        let sweep_handle = self.config.room_idle_timeout.map(|timeout| {
            let rooms = self.rooms.clone();
            let sweep_interval = self.config.sweep_interval;
            tokio::spawn(async move {
                Self::run_sweep_loop(rooms, timeout, sweep_interval).await;
            })
        });

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.connections.load(Ordering::Acquire) >= self.config.max_connections {
                                warn!("connection limit reached, rejecting {}", addr);
                                continue;
                            }
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        if let Some(handle) = sweep_handle {
            handle.abort();
        }

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let rooms = self.rooms.clone();
        let connections = self.connections.clone();
        let conn_id: ConnId = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            // The room code arrives as a query parameter on the handshake
            // request; a connection without one is rejected outright.
            let mut room_code: Option<String> = None;
            let ws_stream = match accept_hdr_async(stream, |req: &Request, resp: Response| {
                match room_code_from_uri(req.uri()) {
                    Some(code) => {
                        room_code = Some(code);
                        Ok(resp)
                    }
                    None => {
                        let mut reject =
                            ErrorResponse::new(Some("missing room code".to_string()));
                        *reject.status_mut() = StatusCode::BAD_REQUEST;
                        Err(reject)
                    }
                }
            })
            .await
            {
                Ok(ws) => ws,
                Err(e) => {
                    debug!("handshake failed for {}: {}", addr, e);
                    return;
                }
            };
            let room_code = match room_code {
                Some(code) => code,
                None => return,
            };

            connections.fetch_add(1, Ordering::AcqRel);
            info!(room = room_code.as_str(), "connection {} joined from {}", conn_id, addr);

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::unbounded_channel();

            let room = rooms.open(&room_code).await;
            room.lock().await.join(conn_id, msg_tx);

            // Outbound frames drain through a dedicated task so room
            // handling never blocks on a slow socket.
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(text) => text,
                        Err(e) => {
                            error!("failed to serialize frame: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                match ClientMessage::from_json(&text) {
                                    Ok(msg) => {
                                        let now = Utc::now().timestamp_millis();
                                        room.lock().await.handle(conn_id, msg, now);
                                    }
                                    Err(e) => {
                                        // Fatal for this frame only, never
                                        // for the connection.
                                        debug!("dropping malformed frame from {}: {}", addr, e);
                                    }
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("connection {} closed", conn_id);
                                break;
                            }
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                debug!("websocket error for {}: {}", addr, e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            sender_task.abort();
            room.lock().await.leave(conn_id);
            connections.fetch_sub(1, Ordering::AcqRel);
            info!(room = room_code.as_str(), "connection {} left", conn_id);
        });
    }

    /// Periodically evict rooms that have sat empty past the timeout.
    async fn run_sweep_loop(
        rooms: Arc<RoomRegistry>,
        idle_timeout: Duration,
        sweep_interval: Duration,
    ) {
        let mut ticker = interval(sweep_interval);
        loop {
            ticker.tick().await;
            let evicted = rooms.sweep_idle(idle_timeout).await;
            if evicted > 0 {
                info!("evicted {} idle room(s)", evicted);
            }
        }
    }

    /// Signal the server to stop accepting and close all connections.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Address the listener actually bound to, once running. Useful when
    /// binding to port 0.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.read().await
    }

    /// Active connection count.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::Acquire)
    }

    /// Active room count.
    pub async fn room_count(&self) -> usize {
        self.rooms.room_count().await
    }
}

/// Extract and normalize the room code from a handshake URI.
fn room_code_from_uri(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "room")
        .and_then(|(_, value)| normalize_room_code(value))
}
