//! JSON samples of the validated tables for frontend development.
//!
//! Only runs against an output directory whose manifest says `validated`.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::{Result, bail};
use itertools::Itertools;
use log::info;
use serde::Serialize;

use crate::{
    artifacts::{self, Manifest},
    model::{CompetitionType, Dataset, MatchBase, MatchOutcome, PlayerStat, StandingRow, Team},
    pipeline,
};

pub const MATCHES_PER_COMPETITION: usize = 4;
pub const MATCH_LIMIT: usize = 20;
pub const PLAYER_LIMIT: usize = 30;
pub const TEAM_LIMIT: usize = 50;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchSide {
    team_id: u32,
    goals: i32,
    shots: Option<i32>,
    shots_on_target: Option<i32>,
    shot_accuracy: Option<f64>,
    fouls: Option<i32>,
    corners: Option<i32>,
    yellow_cards: Option<i32>,
    red_cards: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchMetrics {
    goal_difference: Option<i32>,
    total_goals: Option<i32>,
    total_cards: Option<i32>,
    result: Option<MatchOutcome>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchSample {
    match_id: u32,
    competition: String,
    season: String,
    date: String,
    time: Option<String>,
    home_team: MatchSide,
    away_team: MatchSide,
    stats: MatchMetrics,
    venue: Option<String>,
    referee: Option<String>,
}

impl From<&MatchBase> for MatchSample {
    fn from(row: &MatchBase) -> Self {
        Self {
            match_id: row.match_id,
            competition: row.competition_name.clone(),
            season: row.season.clone(),
            date: row.date.format("%Y-%m-%d").to_string(),
            time: row.time.map(|time| time.format("%H:%M:%S").to_string()),
            home_team: MatchSide {
                team_id: row.home_team_id,
                goals: row.home_goals,
                shots: row.home_shots,
                shots_on_target: row.home_sot,
                shot_accuracy: row.home_shot_accuracy,
                fouls: row.home_fouls,
                corners: row.home_corners,
                yellow_cards: row.home_yellow,
                red_cards: row.home_red,
            },
            away_team: MatchSide {
                team_id: row.away_team_id,
                goals: row.away_goals,
                shots: row.away_shots,
                shots_on_target: row.away_sot,
                shot_accuracy: row.away_shot_accuracy,
                fouls: row.away_fouls,
                corners: row.away_corners,
                yellow_cards: row.away_yellow,
                red_cards: row.away_red,
            },
            stats: MatchMetrics {
                goal_difference: row.goal_difference,
                total_goals: row.total_goals,
                total_cards: row.total_cards,
                result: row.result,
            },
            venue: row.venue.clone(),
            referee: row.referee.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerCounts {
    minutes: Option<i32>,
    games: Option<i32>,
    goals: i32,
    assists: i32,
    shots: Option<i32>,
    shots_on_target: Option<i32>,
    passes_completed: Option<i32>,
    passes_attempted: Option<i32>,
    pass_accuracy: Option<f64>,
    tackles: Option<i32>,
    interceptions: Option<i32>,
    touches: Option<i32>,
    #[serde(rename = "xG")]
    xg: Option<f64>,
    #[serde(rename = "xA")]
    xa: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerMetrics {
    goals_per_game: Option<f64>,
    assists_per_game: Option<f64>,
    shot_efficiency: Option<f64>,
    sot_percentage: Option<f64>,
    goal_contributions: i32,
    contributions_per_game: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerSample {
    player_id: u32,
    name: String,
    team_id: u32,
    team: String,
    position: Option<String>,
    age: Option<f64>,
    stats: PlayerCounts,
    metrics: PlayerMetrics,
}

impl From<&PlayerStat> for PlayerSample {
    fn from(row: &PlayerStat) -> Self {
        Self {
            player_id: row.player_id,
            name: row.player.clone(),
            team_id: row.team_id,
            team: row.team.clone(),
            position: row.position.clone(),
            age: row.age,
            stats: PlayerCounts {
                minutes: row.minutes,
                games: row.games,
                goals: row.goals.unwrap_or(0),
                assists: row.assists.unwrap_or(0),
                shots: row.shots,
                shots_on_target: row.shots_on_target,
                passes_completed: row.passes_completed,
                passes_attempted: row.passes,
                pass_accuracy: row.passes_pct,
                tackles: row.tackles,
                interceptions: row.interceptions,
                touches: row.touches,
                xg: row.xg,
                xa: row.xg_assist,
            },
            metrics: PlayerMetrics {
                goals_per_game: row.goals_per_game,
                assists_per_game: row.assists_per_game,
                shot_efficiency: row.shot_efficiency,
                sot_percentage: row.sot_percentage,
                goal_contributions: row.goal_contributions.unwrap_or(0),
                contributions_per_game: row.contributions_per_game,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StandingCounts {
    played: i32,
    wins: i32,
    draws: i32,
    losses: i32,
    goals_for: i32,
    goals_against: i32,
    goal_difference: Option<i32>,
    points: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StandingMetrics {
    win_percentage: f64,
    points_per_game: f64,
    goals_per_game: f64,
    clean_sheets: i32,
}

#[derive(Debug, Serialize)]
struct StandingSample {
    rank: i32,
    team: String,
    stats: StandingCounts,
    metrics: StandingMetrics,
}

impl From<&StandingRow> for StandingSample {
    fn from(row: &StandingRow) -> Self {
        Self {
            rank: row.rank,
            team: row.team.clone(),
            stats: StandingCounts {
                played: row.played,
                wins: row.wins,
                draws: row.draws,
                losses: row.losses,
                goals_for: row.goals_for,
                goals_against: row.goals_against,
                goal_difference: row.goal_difference,
                points: row.points,
            },
            metrics: StandingMetrics {
                win_percentage: row.win_percentage.unwrap_or(0.0),
                points_per_game: row.points_per_game.unwrap_or(0.0),
                goals_per_game: row.goals_per_game.unwrap_or(0.0),
                clean_sheets: row.clean_sheets.unwrap_or(0),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct TeamSample {
    #[serde(rename = "teamId")]
    team_id: u32,
    name: String,
    #[serde(rename = "type")]
    kind: CompetitionType,
    country: Option<String>,
    competition: String,
}

impl From<&Team> for TeamSample {
    fn from(row: &Team) -> Self {
        Self {
            team_id: row.team_id,
            name: row.team_name.clone(),
            kind: row.competition_type,
            country: row.country.clone(),
            competition: row.primary_competition.clone(),
        }
    }
}

/// First few matches of each competition, competitions in name order.
fn sample_matches(matches: &[MatchBase]) -> Vec<MatchSample> {
    let mut by_competition: BTreeMap<&str, Vec<&MatchBase>> = BTreeMap::new();
    for row in matches {
        let bucket = by_competition.entry(&row.competition_name).or_default();
        if bucket.len() < MATCHES_PER_COMPETITION {
            bucket.push(row);
        }
    }
    by_competition
        .into_values()
        .flatten()
        .take(MATCH_LIMIT)
        .map(MatchSample::from)
        .collect()
}

/// Top scorers; players without a goal count sort last, ties by id.
fn sample_players(stats: &[PlayerStat]) -> Vec<PlayerSample> {
    stats
        .iter()
        .sorted_by(|a, b| {
            b.goals
                .is_some()
                .cmp(&a.goals.is_some())
                .then(b.goals.cmp(&a.goals))
                .then(a.player_id.cmp(&b.player_id))
        })
        .take(PLAYER_LIMIT)
        .map(PlayerSample::from)
        .collect()
}

fn sample_standings(standings: &[StandingRow]) -> BTreeMap<String, Vec<StandingSample>> {
    let mut groups: BTreeMap<String, Vec<&StandingRow>> = BTreeMap::new();
    for row in standings {
        groups.entry(row.group.clone()).or_default().push(row);
    }
    groups
        .into_iter()
        .map(|(group, rows)| {
            let teams = rows
                .into_iter()
                .sorted_by_key(|row| row.rank)
                .map(StandingSample::from)
                .collect_vec();
            (group, teams)
        })
        .collect()
}

fn sample_teams(teams: &[Team]) -> Vec<TeamSample> {
    teams.iter().take(TEAM_LIMIT).map(TeamSample::from).collect()
}

pub const MATCHES_SAMPLE_FILE: &str = "sample_matches.json";
pub const PLAYERS_SAMPLE_FILE: &str = "sample_players.json";
pub const STANDINGS_SAMPLE_FILE: &str = "sample_standings.json";
pub const TEAMS_SAMPLE_FILE: &str = "sample_teams.json";

pub fn export_samples(dataset: &Dataset, json_dir: &Path) -> Result<Vec<PathBuf>> {
    let matches = sample_matches(&dataset.matches_base);
    let players = sample_players(&dataset.player_stats);
    let standings = sample_standings(&dataset.standings);
    let teams = sample_teams(&dataset.teams);

    let written = vec![
        json_dir.join(MATCHES_SAMPLE_FILE),
        json_dir.join(PLAYERS_SAMPLE_FILE),
        json_dir.join(STANDINGS_SAMPLE_FILE),
        json_dir.join(TEAMS_SAMPLE_FILE),
    ];
    artifacts::write_json(&written[0], &matches)?;
    artifacts::write_json(&written[1], &players)?;
    artifacts::write_json(&written[2], &standings)?;
    artifacts::write_json(&written[3], &teams)?;
    info!(
        "✓ Exported {} match(es), {} player(s), {} group(s), {} team(s) to {}",
        matches.len(),
        players.len(),
        standings.len(),
        teams.len(),
        json_dir.display()
    );
    Ok(written)
}

/// Exports samples from `out_dir`, refusing unless the last validation passed
/// and the tables still match the digests recorded for it.
pub fn export_validated(out_dir: &Path, json_dir: &Path) -> Result<Vec<PathBuf>> {
    let manifest = if out_dir.join(artifacts::MANIFEST_FILE).exists() {
        Some(Manifest::load(out_dir)?)
    } else {
        None
    };
    let Some(manifest) = manifest.filter(Manifest::is_validated) else {
        bail!(
            "Output in {} has not passed validation; run the pipeline first",
            out_dir.display()
        );
    };
    manifest.verify(out_dir)?;
    let dataset = pipeline::read_dataset(out_dir)?;
    export_samples(&dataset, json_dir)
}
