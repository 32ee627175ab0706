//! State Migration
//!
//! Upgrades persisted or peer-received state documents to the current
//! shape. Total over any input: optional fields are defaulted during
//! deserialization (see the serde defaults on [`Player`] and
//! [`GameState`]), and a document too corrupt to carry the required
//! `phase`/`players`/`currentRound` falls back silently to the canonical
//! empty state.
//!
//! Invoked on every load-from-storage and every wholesale state install,
//! so it is idempotent: `migrate(migrate(x)) == migrate(x)`.

use serde_json::Value;

use crate::game::state::GameState;

/// Upgrade a raw state document to the current schema.
pub fn migrate(raw: Value) -> GameState {
    serde_json::from_value(raw).unwrap_or_else(|_| GameState::new())
}
