//! Fact normalizer: swaps team and player names for registry ids.
//!
//! Every reference must resolve. The first unknown name aborts with
//! [`PipelineError::UnresolvedReference`]; rows are never dropped here.

use log::info;

use crate::{
    error::PipelineError,
    model::{
        CleanMatch, CleanPlayer, CleanSources, CleanStanding, NormalizedFacts, NormalizedMatch,
        PlayerStat, StandingRow,
    },
    registry::EntityRegistry,
};

pub fn normalize_matches(
    matches: &[CleanMatch],
    registry: &EntityRegistry,
) -> Result<Vec<NormalizedMatch>, PipelineError> {
    matches
        .iter()
        .map(|game| {
            let context = format!(
                "{} match on {} ({} v {})",
                game.competition_name, game.date, game.home_team, game.away_team
            );
            Ok(NormalizedMatch {
                source_kind: game.source_kind,
                competition_name: game.competition_name.clone(),
                season: game.season.clone(),
                date: game.date,
                time: game.time,
                home_team_id: registry.team_id(&game.home_team, &context)?,
                away_team_id: registry.team_id(&game.away_team, &context)?,
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
            })
        })
        .collect()
}

/// Player-season rows come out ordered by `player_id`.
pub fn normalize_player_stats(
    players: &[CleanPlayer],
    registry: &EntityRegistry,
) -> Result<Vec<PlayerStat>, PipelineError> {
    let mut stats = players
        .iter()
        .map(|row| {
            let context = format!("player stats for '{}'", row.player);
            Ok(PlayerStat {
                player_id: registry.player_id(&row.player, &context)?,
                team_id: registry.team_id(&row.team, &context)?,
                player: row.player.clone(),
                team: row.team.clone(),
                position: row.position.clone(),
                age: row.age,
                minutes: row.minutes,
                games: row.games,
                goals: row.goals,
                assists: row.assists,
                shots: row.shots,
                shots_on_target: row.shots_on_target,
                passes_completed: row.passes_completed,
                passes: row.passes,
                passes_pct: row.passes_pct,
                tackles: row.tackles,
                interceptions: row.interceptions,
                clearances: row.clearances,
                touches: row.touches,
                dispossessed: row.dispossessed,
                xg: row.xg,
                xg_assist: row.xg_assist,
                goals_per_game: None,
                assists_per_game: None,
                shot_efficiency: None,
                sot_percentage: None,
                goal_contributions: None,
                contributions_per_game: None,
            })
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;
    stats.sort_by_key(|row| row.player_id);
    Ok(stats)
}

/// Standings come out ordered by group, then rank.
pub fn normalize_standings(
    standings: &[CleanStanding],
    registry: &EntityRegistry,
) -> Result<Vec<StandingRow>, PipelineError> {
    let mut rows = standings
        .iter()
        .map(|row| {
            let context = format!("{} standings", row.group);
            Ok(StandingRow {
                group: row.group.clone(),
                rank: row.rank,
                team_id: registry.team_id(&row.team, &context)?,
                team: row.team.clone(),
                played: row.played,
                wins: row.wins,
                draws: row.draws,
                losses: row.losses,
                goals_for: row.goals_for,
                goals_against: row.goals_against,
                points: row.points,
                goal_difference: None,
                win_percentage: None,
                points_per_game: None,
                goals_per_game: None,
                clean_sheets: None,
            })
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;
    rows.sort_by(|a, b| (&a.group, a.rank, a.team_id).cmp(&(&b.group, b.rank, b.team_id)));
    Ok(rows)
}

pub fn normalize_all(
    sources: &CleanSources,
    registry: &EntityRegistry,
) -> Result<NormalizedFacts, PipelineError> {
    let facts = NormalizedFacts {
        matches: normalize_matches(&sources.matches, registry)?,
        player_stats: normalize_player_stats(&sources.players, registry)?,
        standings: normalize_standings(&sources.standings, registry)?,
    };
    info!(
        "Normalized {} match(es), {} player-season row(s), {} standings row(s)",
        facts.matches.len(),
        facts.player_stats.len(),
        facts.standings.len()
    );
    Ok(facts)
}
