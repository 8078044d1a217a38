//! Row types for every table the pipeline reads or writes.
//!
//! All rows are flat so they round-trip through `csv` + `serde`: a `None`
//! serializes as an empty cell and an empty cell deserializes back to `None`.
//! Derived columns are `Option` on the fact rows; the splitter leaves them
//! empty and the metric deriver fills them in.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

pub type TeamId = u32;
pub type PlayerId = u32;
pub type MatchId = u32;

/// Where a match row came from. Only tournament sources carry advanced stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    League,
    Tournament,
}

impl SourceKind {
    pub fn has_advanced_stats(self) -> bool {
        matches!(self, SourceKind::Tournament)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionType {
    League,
    International,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    #[serde(rename = "H")]
    HomeWin,
    #[serde(rename = "A")]
    AwayWin,
    #[serde(rename = "D")]
    Draw,
}

impl MatchOutcome {
    pub fn from_score(home_goals: i32, away_goals: i32) -> Self {
        match home_goals.cmp(&away_goals) {
            std::cmp::Ordering::Greater => MatchOutcome::HomeWin,
            std::cmp::Ordering::Less => MatchOutcome::AwayWin,
            std::cmp::Ordering::Equal => MatchOutcome::Draw,
        }
    }
}

/// A match as it leaves the loader: names instead of ids, league and
/// tournament sources in one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanMatch {
    pub source_kind: SourceKind,
    pub competition_name: String,
    pub season: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: i32,
    pub away_goals: i32,
    pub home_shots: Option<i32>,
    pub away_shots: Option<i32>,
    pub home_sot: Option<i32>,
    pub away_sot: Option<i32>,
    pub home_fouls: Option<i32>,
    pub away_fouls: Option<i32>,
    pub home_corners: Option<i32>,
    pub away_corners: Option<i32>,
    pub home_yellow: Option<i32>,
    pub away_yellow: Option<i32>,
    pub home_red: Option<i32>,
    pub away_red: Option<i32>,
    pub venue: Option<String>,
    pub referee: Option<String>,
    pub home_xg: Option<f64>,
    pub away_xg: Option<f64>,
    pub home_possession: Option<f64>,
    pub away_possession: Option<f64>,
    pub home_passes_completed: Option<i32>,
    pub home_passes_attempted: Option<i32>,
    pub away_passes_completed: Option<i32>,
    pub away_passes_attempted: Option<i32>,
    pub home_tackles: Option<i32>,
    pub away_tackles: Option<i32>,
    pub home_interceptions: Option<i32>,
    pub away_interceptions: Option<i32>,
    pub home_clearances: Option<i32>,
    pub away_clearances: Option<i32>,
    pub home_saves: Option<i32>,
    pub away_saves: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanStanding {
    pub group: String,
    pub rank: i32,
    pub team: String,
    pub played: i32,
    pub wins: i32,
    pub draws: i32,
    pub losses: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub points: i32,
}

/// One merged player-season record built from the per-topic player files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanPlayer {
    pub player: String,
    pub team: String,
    pub position: Option<String>,
    pub age: Option<f64>,
    pub minutes: Option<i32>,
    pub games: Option<i32>,
    pub goals: Option<i32>,
    pub assists: Option<i32>,
    pub shots: Option<i32>,
    pub shots_on_target: Option<i32>,
    pub passes_completed: Option<i32>,
    pub passes: Option<i32>,
    pub passes_pct: Option<f64>,
    pub tackles: Option<i32>,
    pub interceptions: Option<i32>,
    pub clearances: Option<i32>,
    pub touches: Option<i32>,
    pub dispossessed: Option<i32>,
    pub xg: Option<f64>,
    pub xg_assist: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: TeamId,
    pub team_name: String,
    pub competition_type: CompetitionType,
    pub country: Option<String>,
    pub primary_competition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: PlayerId,
    pub player_name: String,
    pub team_id: TeamId,
    pub team_name: String,
    pub position: Option<String>,
    pub age: Option<f64>,
}

/// A match after the normalizer has swapped team names for registry ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMatch {
    pub source_kind: SourceKind,
    pub competition_name: String,
    pub season: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub home_goals: i32,
    pub away_goals: i32,
    pub home_shots: Option<i32>,
    pub away_shots: Option<i32>,
    pub home_sot: Option<i32>,
    pub away_sot: Option<i32>,
    pub home_fouls: Option<i32>,
    pub away_fouls: Option<i32>,
    pub home_corners: Option<i32>,
    pub away_corners: Option<i32>,
    pub home_yellow: Option<i32>,
    pub away_yellow: Option<i32>,
    pub home_red: Option<i32>,
    pub away_red: Option<i32>,
    pub venue: Option<String>,
    pub referee: Option<String>,
    pub home_xg: Option<f64>,
    pub away_xg: Option<f64>,
    pub home_possession: Option<f64>,
    pub away_possession: Option<f64>,
    pub home_passes_completed: Option<i32>,
    pub home_passes_attempted: Option<i32>,
    pub away_passes_completed: Option<i32>,
    pub away_passes_attempted: Option<i32>,
    pub home_tackles: Option<i32>,
    pub away_tackles: Option<i32>,
    pub home_interceptions: Option<i32>,
    pub away_interceptions: Option<i32>,
    pub home_clearances: Option<i32>,
    pub away_clearances: Option<i32>,
    pub home_saves: Option<i32>,
    pub away_saves: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchBase {
    pub match_id: MatchId,
    pub competition_name: String,
    pub season: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub home_goals: i32,
    pub away_goals: i32,
    pub home_shots: Option<i32>,
    pub away_shots: Option<i32>,
    pub home_sot: Option<i32>,
    pub away_sot: Option<i32>,
    pub home_fouls: Option<i32>,
    pub away_fouls: Option<i32>,
    pub home_corners: Option<i32>,
    pub away_corners: Option<i32>,
    pub home_yellow: Option<i32>,
    pub away_yellow: Option<i32>,
    pub home_red: Option<i32>,
    pub away_red: Option<i32>,
    pub venue: Option<String>,
    pub referee: Option<String>,
    pub goal_difference: Option<i32>,
    pub total_goals: Option<i32>,
    pub total_cards: Option<i32>,
    pub home_shot_accuracy: Option<f64>,
    pub away_shot_accuracy: Option<f64>,
    pub result: Option<MatchOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchAdvanced {
    pub match_id: MatchId,
    pub home_xg: Option<f64>,
    pub away_xg: Option<f64>,
    pub home_possession: Option<f64>,
    pub away_possession: Option<f64>,
    pub home_passes_completed: Option<i32>,
    pub home_passes_attempted: Option<i32>,
    pub away_passes_completed: Option<i32>,
    pub away_passes_attempted: Option<i32>,
    pub home_tackles: Option<i32>,
    pub away_tackles: Option<i32>,
    pub home_interceptions: Option<i32>,
    pub away_interceptions: Option<i32>,
    pub home_clearances: Option<i32>,
    pub away_clearances: Option<i32>,
    pub home_saves: Option<i32>,
    pub away_saves: Option<i32>,
    pub home_pass_accuracy: Option<f64>,
    pub away_pass_accuracy: Option<f64>,
    pub possession_delta: Option<f64>,
    pub xg_difference: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStat {
    pub player_id: PlayerId,
    pub team_id: TeamId,
    pub player: String,
    pub team: String,
    pub position: Option<String>,
    pub age: Option<f64>,
    pub minutes: Option<i32>,
    pub games: Option<i32>,
    pub goals: Option<i32>,
    pub assists: Option<i32>,
    pub shots: Option<i32>,
    pub shots_on_target: Option<i32>,
    pub passes_completed: Option<i32>,
    pub passes: Option<i32>,
    pub passes_pct: Option<f64>,
    pub tackles: Option<i32>,
    pub interceptions: Option<i32>,
    pub clearances: Option<i32>,
    pub touches: Option<i32>,
    pub dispossessed: Option<i32>,
    pub xg: Option<f64>,
    pub xg_assist: Option<f64>,
    pub goals_per_game: Option<f64>,
    pub assists_per_game: Option<f64>,
    pub shot_efficiency: Option<f64>,
    pub sot_percentage: Option<f64>,
    pub goal_contributions: Option<i32>,
    pub contributions_per_game: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingRow {
    pub group: String,
    pub rank: i32,
    pub team_id: TeamId,
    pub team: String,
    pub played: i32,
    pub wins: i32,
    pub draws: i32,
    pub losses: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub points: i32,
    pub goal_difference: Option<i32>,
    pub win_percentage: Option<f64>,
    pub points_per_game: Option<f64>,
    pub goals_per_game: Option<f64>,
    pub clean_sheets: Option<i32>,
}

/// Everything the loader produced for one run, in source-processing order.
#[derive(Debug, Clone, Default)]
pub struct CleanSources {
    pub matches: Vec<CleanMatch>,
    pub standings: Vec<CleanStanding>,
    pub players: Vec<CleanPlayer>,
}

/// Normalized facts, ready for splitting.
#[derive(Debug, Clone, Default)]
pub struct NormalizedFacts {
    pub matches: Vec<NormalizedMatch>,
    pub player_stats: Vec<PlayerStat>,
    pub standings: Vec<StandingRow>,
}

/// The six final tables.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub teams: Vec<Team>,
    pub players: Vec<Player>,
    pub matches_base: Vec<MatchBase>,
    pub matches_advanced: Vec<MatchAdvanced>,
    pub player_stats: Vec<PlayerStat>,
    pub standings: Vec<StandingRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_follows_score() {
        assert_eq!(MatchOutcome::from_score(2, 1), MatchOutcome::HomeWin);
        assert_eq!(MatchOutcome::from_score(0, 3), MatchOutcome::AwayWin);
        assert_eq!(MatchOutcome::from_score(1, 1), MatchOutcome::Draw);
    }

    #[test]
    fn only_tournament_sources_carry_advanced_stats() {
        assert!(SourceKind::Tournament.has_advanced_stats());
        assert!(!SourceKind::League.has_advanced_stats());
    }
}
