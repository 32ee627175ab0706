//! Solo Session
//!
//! Single-device mode: one process owns the state, applies actions
//! through the reducer directly, and persists a snapshot after every
//! transition. The persisted snapshot is read back through `migrate` on
//! start; corruption or absence falls back silently to the empty state.

use chrono::Utc;
use serde_json::Value;
use tracing::warn;

use crate::game::action::GameAction;
use crate::game::migrate::migrate;
use crate::game::reduce::reduce;
use crate::game::state::GameState;
use crate::session::store::SnapshotStore;
use crate::session::Dispatcher;

/// A solo game over a snapshot store.
pub struct SoloGame<S: SnapshotStore> {
    state: GameState,
    store: S,
}

impl<S: SnapshotStore> SoloGame<S> {
    /// Load the last known state from the store, or start fresh.
    pub fn load(store: S) -> Self {
        let state = store
            .load()
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
            .map(migrate)
            .unwrap_or_default();
        Self { state, store }
    }

    /// Current state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Consume the session, returning its store.
    pub fn into_store(self) -> S {
        self.store
    }

    fn persist(&mut self) {
        match serde_json::to_string(&self.state) {
            Ok(raw) => {
                if let Err(e) = self.store.save(&raw) {
                    // Persistence is best-effort; the game plays on.
                    warn!("failed to persist snapshot: {}", e);
                }
            }
            Err(e) => warn!("failed to serialize snapshot: {}", e),
        }
    }
}

impl<S: SnapshotStore> Dispatcher for SoloGame<S> {
    fn dispatch(&mut self, action: GameAction) {
        self.state = reduce(&self.state, &action, Utc::now().timestamp_millis());
        self.persist();
    }

    fn current_state(&self) -> GameState {
        self.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::GamePhase;
    use crate::session::store::MemoryStore;

    #[test]
    fn test_starts_empty_without_snapshot() {
        let game = SoloGame::load(MemoryStore::new());
        assert_eq!(game.state(), &GameState::new());
    }

    #[test]
    fn test_corrupt_snapshot_falls_back_to_empty() {
        let game = SoloGame::load(MemoryStore::with_value("{not json"));
        assert_eq!(game.state(), &GameState::new());

        let game = SoloGame::load(MemoryStore::with_value(r#"{"players":"nope"}"#));
        assert_eq!(game.state(), &GameState::new());
    }

    #[test]
    fn test_persists_after_every_transition() {
        let mut game = SoloGame::load(MemoryStore::new());
        game.dispatch(GameAction::AddPlayer { name: "A".into() });
        game.dispatch(GameAction::AddPlayer { name: "B".into() });
        game.dispatch(GameAction::StartGame);

        let saved = game.into_store();
        let reloaded = SoloGame::load(saved);
        assert_eq!(reloaded.state().players.len(), 2);
        assert_eq!(reloaded.state().phase, GamePhase::Playing);
    }

    #[test]
    fn test_reload_migrates_old_snapshot_shape() {
        // Snapshot from before drink and submission tracking.
        let store = MemoryStore::with_value(
            r#"{"phase":"playing","players":[{"id":"p1","name":"A","totalPoints":60,"roundHistory":[]}],"currentRound":2}"#,
        );
        let game = SoloGame::load(store);
        assert_eq!(game.state().players[0].shots_taken, 0);
        assert!(game.state().round_submissions.is_empty());
        assert_eq!(game.state().current_round, 2);
    }
}
