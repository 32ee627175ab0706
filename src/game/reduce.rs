//! Transition Function
//!
//! The single source of truth for all game-rule logic. `reduce` is pure and
//! total: given a state, an action, and an explicit timestamp it produces
//! the next state and never fails. Illegal transitions (double submission,
//! insufficient balance for a drink) return the input unchanged; they are
//! reachable through normal UI gating and treated as benign no-ops.

use crate::game::action::GameAction;
use crate::game::migrate::migrate;
use crate::game::state::{EntrySource, GamePhase, GameState, Player, PlayerId, RoundEntry};

/// Points charged to the loser of a round.
pub const WIN_BONUS_POINTS: i64 = 50;

/// Points paid down by one shot; also the threshold to take one.
pub const SHOT_POINTS: i64 = 100;

/// Points paid down by one sip; also the threshold to take one.
pub const SIP_POINTS: i64 = 10;

/// Apply one action to the state, producing the next state.
///
/// `now` is the timestamp (epoch milliseconds) recorded on any history
/// entry the action produces; the caller owns the clock.
pub fn reduce(state: &GameState, action: &GameAction, now: i64) -> GameState {
    match action {
        GameAction::AddPlayer { name } => {
            let mut next = state.clone();
            next.players.push(Player::new(name.clone()));
            next
        }

        GameAction::RemovePlayer { player_id } => {
            let mut next = state.clone();
            next.players.retain(|p| &p.id != player_id);
            next.round_submissions.remove(player_id);
            next
        }

        GameAction::StartGame => {
            let mut next = state.clone();
            next.phase = GamePhase::Playing;
            next.round_submissions.clear();
            next
        }

        GameAction::AddScore { player_id, points } => {
            if state.round_submissions.contains(player_id) {
                return state.clone();
            }
            let mut next = state.clone();
            let round = next.current_round;
            if let Some(player) = next.player_mut(player_id) {
                player.total_points += points;
                player.round_history.push(RoundEntry {
                    round,
                    points_added: *points,
                    source: EntrySource::Score,
                    timestamp: now,
                });
                next.round_submissions.insert(player_id.clone());
            }
            advance_if_complete(&mut next);
            next
        }

        GameAction::WinRound { winner_id, loser_id } => {
            if state.round_submissions.contains(winner_id) {
                return state.clone();
            }
            let mut next = state.clone();
            let round = next.current_round;
            if let Some(loser) = next.player_mut(loser_id) {
                loser.total_points += WIN_BONUS_POINTS;
                loser.round_history.push(RoundEntry {
                    round,
                    points_added: WIN_BONUS_POINTS,
                    source: EntrySource::WinBonus,
                    timestamp: now,
                });
            }
            // The winner, not the loser, is the submitter for this round.
            if next.has_player(winner_id) {
                next.round_submissions.insert(winner_id.clone());
            }
            advance_if_complete(&mut next);
            next
        }

        GameAction::TakeShot { player_id } => {
            take_drink(state, player_id, SHOT_POINTS, EntrySource::DrinkShot, now)
        }

        GameAction::TakeSip { player_id } => {
            take_drink(state, player_id, SIP_POINTS, EntrySource::DrinkSip, now)
        }

        GameAction::ResetGame => GameState::new(),

        GameAction::LoadState { state } => migrate(state.clone()),

        // Forward compatibility: an unknown tag never fails, it is ignored.
        GameAction::Unknown => state.clone(),
    }
}

/// Advance the round once every current player has submitted.
///
/// Recomputed against the current player list, so a player removed
/// mid-round no longer blocks advancement.
fn advance_if_complete(state: &mut GameState) {
    let all_submitted = state
        .players
        .iter()
        .all(|p| state.round_submissions.contains(&p.id));
    if all_submitted {
        state.current_round += 1;
        state.round_submissions.clear();
    }
}

/// Pay down `cost` points with a drink. Guarded: a player below the
/// threshold is left unchanged, never driven negative.
fn take_drink(
    state: &GameState,
    player_id: &PlayerId,
    cost: i64,
    source: EntrySource,
    now: i64,
) -> GameState {
    let mut next = state.clone();
    let round = next.current_round;
    if let Some(player) = next.player_mut(player_id) {
        if player.total_points >= cost {
            player.total_points -= cost;
            match source {
                EntrySource::DrinkShot => player.shots_taken += 1,
                EntrySource::DrinkSip => player.sips_taken += 1,
                EntrySource::Score | EntrySource::WinBonus => {}
            }
            player.round_history.push(RoundEntry {
                round,
                points_added: -cost,
                source,
                timestamp: now,
            });
        }
    }
    next
}
