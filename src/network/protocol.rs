//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket. All
//! messages are JSON text frames; the room identifier travels out-of-band
//! as a query parameter on the connection URL, never in a payload.

use serde::{Deserialize, Serialize};

use crate::game::action::GameAction;
use crate::game::state::GameState;

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Propose an action against the room's canonical state.
    Action {
        /// The proposed transition.
        action: GameAction,
    },

    /// Ask for the current full state, sent back to this connection only.
    RequestState,
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// The full canonical state. Always a wholesale replacement, never a
    /// partial patch.
    State {
        /// Current canonical state of the room.
        state: GameState,
    },

    /// Number of connections currently in the room.
    Peers {
        /// Connection count, including the recipient.
        count: usize,
    },
}

impl ClientMessage {
    /// Serialize to a JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from a JSON text frame.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to a JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from a JSON text frame.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::PlayerId;

    #[test]
    fn test_action_frame_shape() {
        let msg = ClientMessage::Action {
            action: GameAction::AddScore {
                player_id: PlayerId::new("p1"),
                points: 10,
            },
        };
        let json = msg.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"type":"action","action":{"type":"ADD_SCORE","playerId":"p1","points":10}}"#
        );
    }

    #[test]
    fn test_request_state_frame_shape() {
        let json = ClientMessage::RequestState.to_json().unwrap();
        assert_eq!(json, r#"{"type":"request-state"}"#);
        let parsed = ClientMessage::from_json(&json).unwrap();
        assert_eq!(parsed, ClientMessage::RequestState);
    }

    #[test]
    fn test_state_frame_roundtrip() {
        let msg = ServerMessage::State { state: GameState::new() };
        let json = msg.to_json().unwrap();
        assert!(json.starts_with(r#"{"type":"state","state":"#));

        let parsed = ServerMessage::from_json(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_peers_frame_shape() {
        let json = ServerMessage::Peers { count: 3 }.to_json().unwrap();
        assert_eq!(json, r#"{"type":"peers","count":3}"#);
    }

    #[test]
    fn test_malformed_frame_is_an_error() {
        assert!(ClientMessage::from_json("not json").is_err());
        assert!(ClientMessage::from_json(r#"{"type":"teleport"}"#).is_err());
    }
}
