//! # Drink Tally Server
//!
//! Score tracking for a social drinking game: point totals convert into
//! drink obligations, either on one device or shared live across several.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    DRINK TALLY SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/           - Authoritative model (pure)                │
//! │  ├── state.rs    - Players, history, round bookkeeping       │
//! │  ├── action.rs   - Tagged action set                         │
//! │  ├── reduce.rs   - (state, action, now) -> state'            │
//! │  ├── migrate.rs  - Schema upgrade of raw state documents     │
//! │  └── stats.rs    - Drinks owed, ranks, danger level          │
//! │                                                              │
//! │  network/        - Online mode                               │
//! │  ├── protocol.rs - JSON wire frames                          │
//! │  ├── room.rs     - Canonical state + connection set per room │
//! │  ├── relay.rs    - WebSocket relay server                    │
//! │  └── client.rs   - Client sync session (mirror + dispatch)   │
//! │                                                              │
//! │  session/        - Device-local concerns                     │
//! │  ├── solo.rs     - Reduce-then-persist loop                  │
//! │  ├── store.rs    - Snapshot storage                          │
//! │  └── undo.rs     - Snapshot/replay overlay                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Authority
//!
//! All game-rule logic lives in [`game::reduce::reduce`], a pure function
//! over an explicit timestamp. In online mode the relay owns the only
//! authoritative copy of each room's state: clients propose actions and
//! mirror whatever full state the relay broadcasts back. Whichever action
//! the relay's queue delivers first wins; there is no merge.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod codes;
pub mod game;
pub mod network;
pub mod session;

pub use game::action::GameAction;
pub use game::migrate::migrate;
pub use game::reduce::reduce;
pub use game::state::{GamePhase, GameState, Player, PlayerId};
pub use game::stats::{compute_stats, rank_players, DangerLevel, DerivedStats};
pub use network::client::{ClientConfig, ConnectionStatus, SyncSession};
pub use network::relay::{RelayConfig, RelayServer};
pub use session::solo::SoloGame;
pub use session::store::{FileStore, MemoryStore, SnapshotStore};
pub use session::undo::UndoDispatcher;
pub use session::Dispatcher;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
