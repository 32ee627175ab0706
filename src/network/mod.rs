//! Networking
//!
//! The online half of the system: wire protocol, per-room relay state,
//! the WebSocket relay server, and the client-side sync session. Nothing
//! here contains game rules; every mutation goes through
//! [`crate::game::reduce`].

pub mod client;
pub mod protocol;
pub mod relay;
pub mod room;
