//! Game Actions
//!
//! The closed set of state transitions, tagged for the wire. Tags use the
//! SCREAMING_SNAKE_CASE names established by existing clients, with an
//! explicit catch-all so an unknown tag from a newer client deserializes
//! instead of poisoning the message.

use serde::{Deserialize, Serialize};

use crate::game::state::PlayerId;

/// A proposed state transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum GameAction {
    /// Append a new player with a fresh id.
    AddPlayer {
        /// Display name; any string accepted, collisions are a UI concern.
        name: String,
    },

    /// Remove a player and their pending submission.
    RemovePlayer {
        /// Id of the player to remove. No-op if absent.
        player_id: PlayerId,
    },

    /// Begin scoring: setup -> playing.
    StartGame,

    /// Record a score submission for the current round.
    AddScore {
        /// Submitting player.
        player_id: PlayerId,
        /// Points to add. Positivity is a caller concern.
        points: i64,
    },

    /// Record a round win: the loser is charged the win bonus, the winner
    /// is marked as submitted.
    WinRound {
        /// Player who won the round.
        winner_id: PlayerId,
        /// Player charged the 50-point bonus.
        loser_id: PlayerId,
    },

    /// Pay down 100 points with a shot.
    TakeShot {
        /// Drinking player. No-op below 100 points.
        player_id: PlayerId,
    },

    /// Pay down 10 points with a sip.
    TakeSip {
        /// Drinking player. No-op below 10 points.
        player_id: PlayerId,
    },

    /// Discard everything and return to the empty setup state.
    ResetGame,

    /// Install a full state wholesale, migrating its shape first. Used by
    /// undo snapshots and peer-provided state.
    LoadState {
        /// Raw state document; missing optional fields are defaulted.
        state: serde_json::Value,
    },

    /// Unrecognized tag from a newer or diverged client. Reduces to a no-op.
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_tags() {
        let json = serde_json::to_string(&GameAction::AddPlayer { name: "Rex".into() }).unwrap();
        assert_eq!(json, r#"{"type":"ADD_PLAYER","name":"Rex"}"#);

        let json = serde_json::to_string(&GameAction::StartGame).unwrap();
        assert_eq!(json, r#"{"type":"START_GAME"}"#);

        let json = serde_json::to_string(&GameAction::AddScore {
            player_id: PlayerId::new("p1"),
            points: 20,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"ADD_SCORE","playerId":"p1","points":20}"#);

        let json = serde_json::to_string(&GameAction::WinRound {
            winner_id: PlayerId::new("a"),
            loser_id: PlayerId::new("b"),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"WIN_ROUND","winnerId":"a","loserId":"b"}"#);
    }

    #[test]
    fn test_action_parses_from_wire() {
        let action: GameAction =
            serde_json::from_str(r#"{"type":"TAKE_SHOT","playerId":"p1"}"#).unwrap();
        assert_eq!(
            action,
            GameAction::TakeShot { player_id: PlayerId::new("p1") }
        );
    }

    #[test]
    fn test_unknown_tag_parses_to_unknown() {
        let action: GameAction =
            serde_json::from_str(r#"{"type":"SHUFFLE_DECK","deckId":"d1"}"#).unwrap();
        assert_eq!(action, GameAction::Unknown);
    }
}
