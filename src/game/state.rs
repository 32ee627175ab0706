//! Game State Definitions
//!
//! All state types for a tally game: players, their scoring history, and
//! the round bookkeeping the reducer operates on. Field names serialize in
//! camelCase so snapshots and wire frames stay compatible across clients.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// PLAYER ID
// =============================================================================

/// Unique player identifier (UUID v4 as text).
///
/// Implements Ord for deterministic `BTreeSet` membership.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Wrap an existing identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh unique identifier.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// ROUND HISTORY
// =============================================================================

/// What produced a history entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntrySource {
    /// A regular score submission.
    Score,
    /// The 50-point penalty charged to the loser of a round.
    WinBonus,
    /// A shot taken, paying down 100 points.
    DrinkShot,
    /// A sip taken, paying down 10 points.
    DrinkSip,
}

/// One immutable entry in a player's scoring history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundEntry {
    /// Round the entry was recorded in (1-based).
    pub round: u32,
    /// Signed point delta (negative for drinks).
    pub points_added: i64,
    /// What produced this entry.
    pub source: EntrySource,
    /// Epoch milliseconds when the entry was recorded.
    pub timestamp: i64,
}

// =============================================================================
// PLAYER
// =============================================================================

/// State of a single player.
///
/// The drink counters and history carry serde defaults: snapshots captured
/// before drink tracking existed deserialize with zeroed counters instead
/// of failing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Unique identifier, assigned at creation, immutable.
    pub id: PlayerId,

    /// Display name. Uniqueness is a caller concern.
    pub name: String,

    /// Current point debt. Never negative; drink payouts are guarded.
    #[serde(default)]
    pub total_points: i64,

    /// Append-only scoring history, cleared only by a full reset.
    #[serde(default)]
    pub round_history: Vec<RoundEntry>,

    /// Shots taken so far.
    #[serde(default)]
    pub shots_taken: u32,

    /// Sips taken so far.
    #[serde(default)]
    pub sips_taken: u32,
}

impl Player {
    /// Create a new player with a fresh id and zeroed counters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::random(),
            name: name.into(),
            total_points: 0,
            round_history: Vec::new(),
            shots_taken: 0,
            sips_taken: 0,
        }
    }

    /// Most recent history entry, if any.
    pub fn last_entry(&self) -> Option<&RoundEntry> {
        self.round_history.last()
    }
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Coarse game phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Adding players; scoring not yet active.
    Setup,
    /// Scoring active.
    Playing,
}

/// The complete game state: a single value, replaced on every transition.
///
/// Invariant: `round_submissions` only holds ids of current players.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Current phase.
    pub phase: GamePhase,

    /// Players in join order (also display order).
    pub players: Vec<Player>,

    /// Current round, starting at 1.
    pub current_round: u32,

    /// Ids of players who have submitted a scoring action this round.
    ///
    /// Defaults to empty on deserialize: snapshots captured before
    /// round-submission tracking existed load cleanly.
    #[serde(default)]
    pub round_submissions: BTreeSet<PlayerId>,
}

impl GameState {
    /// The canonical empty state: setup phase, no players, round 1.
    pub fn new() -> Self {
        Self {
            phase: GamePhase::Setup,
            players: Vec::new(),
            current_round: 1,
            round_submissions: BTreeSet::new(),
        }
    }

    /// Look up a player by id.
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    /// Look up a player by id, mutably.
    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.id == id)
    }

    /// Whether a player with this id exists.
    pub fn has_player(&self, id: &PlayerId) -> bool {
        self.players.iter().any(|p| &p.id == id)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
