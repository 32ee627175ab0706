//! Derived Stats
//!
//! Presentation-independent values computed from state, never stored:
//! drink obligations, danger level, competition ranks. Used identically by
//! any client in either mode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::game::reduce::{SHOT_POINTS, SIP_POINTS};
use crate::game::state::{EntrySource, Player, PlayerId};

/// How much trouble a player is in, thresholded on point debt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DangerLevel {
    /// Zero points.
    Safe,
    /// Below 50 points.
    Mild,
    /// 50 to 99 points.
    Hot,
    /// 100 points or more: a shot is owed.
    Critical,
}

/// Derived per-player values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStats {
    /// Whole shots implied by the current point total.
    pub shots_owed: i64,
    /// Whole sips implied by the remainder below one shot.
    pub sips_owed: i64,
    /// Points until the next sip boundary (0 when exactly on one).
    pub pts_until_next_sip: i64,
    /// Shots plus sips actually taken.
    pub total_drinks_taken: u32,
    /// Label for the most recent history entry, if any.
    pub last_action: Option<String>,
    /// Timestamp of the most recent history entry, if any.
    pub last_action_time: Option<i64>,
    /// Danger bucket for the current point total.
    pub danger_level: DangerLevel,
}

/// Compute derived values for one player. O(1): only the last history
/// entry is read.
pub fn compute_stats(player: &Player) -> DerivedStats {
    let shots_owed = player.total_points / SHOT_POINTS;
    let sips_owed = (player.total_points % SHOT_POINTS) / SIP_POINTS;
    let remainder = player.total_points % SIP_POINTS;
    let pts_until_next_sip = if remainder == 0 { 0 } else { SIP_POINTS - remainder };

    let last_entry = player.last_entry();
    let last_action = last_entry.map(|entry| match entry.source {
        EntrySource::Score => format!("+{} pts", entry.points_added),
        EntrySource::WinBonus => "+50 bonus".to_string(),
        EntrySource::DrinkShot => "took shot".to_string(),
        EntrySource::DrinkSip => "took sip".to_string(),
    });

    let danger_level = if player.total_points >= 100 {
        DangerLevel::Critical
    } else if player.total_points >= 50 {
        DangerLevel::Hot
    } else if player.total_points > 0 {
        DangerLevel::Mild
    } else {
        DangerLevel::Safe
    };

    DerivedStats {
        shots_owed,
        sips_owed,
        pts_until_next_sip,
        total_drinks_taken: player.shots_taken + player.sips_taken,
        last_action,
        last_action_time: last_entry.map(|entry| entry.timestamp),
        danger_level,
    }
}

/// Competition ranking over any player list, lowest point debt first.
///
/// Ties share a rank; the next distinct total takes its 1-based position
/// ("1, 1, 3", never "1, 1, 2").
pub fn rank_players(players: &[Player]) -> BTreeMap<PlayerId, usize> {
    let mut sorted: Vec<&Player> = players.iter().collect();
    sorted.sort_by_key(|p| p.total_points);

    let mut ranks = BTreeMap::new();
    let mut current_rank = 1;
    for (i, player) in sorted.iter().enumerate() {
        if i > 0 && player.total_points != sorted[i - 1].total_points {
            current_rank = i + 1;
        }
        ranks.insert(player.id.clone(), current_rank);
    }
    ranks
}

/// Human-readable age of a timestamp relative to `now` (both epoch
/// milliseconds).
pub fn format_relative_time(timestamp: i64, now: i64) -> String {
    let diff = (now - timestamp).max(0) / 1000;
    if diff < 10 {
        return "just now".to_string();
    }
    if diff < 60 {
        return format!("{diff}s ago");
    }
    let mins = diff / 60;
    if mins < 60 {
        return format!("{mins}m ago");
    }
    format!("{}h ago", mins / 60)
}
