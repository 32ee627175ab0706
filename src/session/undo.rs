//! Undo Overlay
//!
//! A convenience wrapper around a dispatch path, not part of the
//! authoritative model. Before forwarding a scoring action it snapshots
//! the current state; within a fixed window the snapshot can be replayed
//! through an ordinary `LOAD_STATE` dispatch. One snapshot at a time; a
//! newer scoring action replaces it, and the window expiring discards it.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::game::action::GameAction;
use crate::game::state::GameState;
use crate::session::Dispatcher;

/// How long a snapshot stays replayable.
pub const UNDO_WINDOW: Duration = Duration::from_secs(10);

/// Dispatch decorator holding at most one revert snapshot.
pub struct UndoDispatcher<D: Dispatcher> {
    inner: D,
    window: Duration,
    snapshot: Option<(GameState, Instant)>,
}

impl<D: Dispatcher> UndoDispatcher<D> {
    /// Wrap a dispatcher with the default 10 second window.
    pub fn new(inner: D) -> Self {
        Self::with_window(inner, UNDO_WINDOW)
    }

    /// Wrap a dispatcher with a custom window.
    pub fn with_window(inner: D, window: Duration) -> Self {
        Self { inner, window, snapshot: None }
    }

    /// Whether a snapshot is held and still inside the window.
    pub fn can_undo(&self) -> bool {
        matches!(self.snapshot, Some((_, taken)) if taken.elapsed() < self.window)
    }

    /// Replay the held snapshot through a `LOAD_STATE` dispatch and
    /// discard it. No-op if no snapshot is held or the window has passed.
    pub fn undo(&mut self) {
        let Some((snapshot, taken)) = self.snapshot.take() else {
            return;
        };
        if taken.elapsed() >= self.window {
            return;
        }
        match serde_json::to_value(&snapshot) {
            Ok(state) => self.inner.dispatch(GameAction::LoadState { state }),
            Err(e) => debug!("undo snapshot not serializable: {}", e),
        }
    }

    /// Unwrap the inner dispatcher.
    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D: Dispatcher> Dispatcher for UndoDispatcher<D> {
    fn dispatch(&mut self, action: GameAction) {
        // Only scoring actions are revertable.
        if matches!(
            action,
            GameAction::AddScore { .. } | GameAction::WinRound { .. }
        ) {
            self.snapshot = Some((self.inner.current_state(), Instant::now()));
        }
        self.inner.dispatch(action);
    }

    fn current_state(&self) -> GameState {
        self.inner.current_state()
    }
}
