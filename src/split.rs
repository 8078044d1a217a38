//! Fact splitter: every normalized match lands in the base table; only
//! matches from sources that carry advanced stats get an advanced row.

use log::info;

use crate::model::{MatchAdvanced, MatchBase, MatchId, NormalizedMatch};

/// Assigns match ids in input order and partitions by source kind. Derived
/// columns are left empty for the metric deriver.
pub fn split_matches(matches: &[NormalizedMatch]) -> (Vec<MatchBase>, Vec<MatchAdvanced>) {
    let mut base = Vec::with_capacity(matches.len());
    let mut advanced = Vec::new();
    for (idx, game) in matches.iter().enumerate() {
        let match_id = idx as MatchId + 1;
        base.push(MatchBase {
            match_id,
            competition_name: game.competition_name.clone(),
            season: game.season.clone(),
            date: game.date,
            time: game.time,
            home_team_id: game.home_team_id,
            away_team_id: game.away_team_id,
            home_goals: game.home_goals,
            away_goals: game.away_goals,
            home_shots: game.home_shots,
            away_shots: game.away_shots,
            home_sot: game.home_sot,
            away_sot: game.away_sot,
            home_fouls: game.home_fouls,
            away_fouls: game.away_fouls,
            home_corners: game.home_corners,
            away_corners: game.away_corners,
            home_yellow: game.home_yellow,
            away_yellow: game.away_yellow,
            home_red: game.home_red,
            away_red: game.away_red,
            venue: game.venue.clone(),
            referee: game.referee.clone(),
            goal_difference: None,
            total_goals: None,
            total_cards: None,
            home_shot_accuracy: None,
            away_shot_accuracy: None,
            result: None,
        });
        if game.source_kind.has_advanced_stats() {
            advanced.push(MatchAdvanced {
                match_id,
                home_xg: game.home_xg,
                away_xg: game.away_xg,
                home_possession: game.home_possession,
                away_possession: game.away_possession,
                home_passes_completed: game.home_passes_completed,
                home_passes_attempted: game.home_passes_attempted,
                away_passes_completed: game.away_passes_completed,
                away_passes_attempted: game.away_passes_attempted,
                home_tackles: game.home_tackles,
                away_tackles: game.away_tackles,
                home_interceptions: game.home_interceptions,
                away_interceptions: game.away_interceptions,
                home_clearances: game.home_clearances,
                away_clearances: game.away_clearances,
                home_saves: game.home_saves,
                away_saves: game.away_saves,
                home_pass_accuracy: None,
                away_pass_accuracy: None,
                possession_delta: None,
                xg_difference: None,
            });
        }
    }
    info!(
        "Split {} match(es): {} with advanced stats",
        base.len(),
        advanced.len()
    );
    (base, advanced)
}
